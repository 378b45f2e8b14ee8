//! A small floating-point calculator: numbers and named constants are both
//! plain identifiers, and the resolver decides which is which.
//!
//! Run with `cargo run --example calculator`.

use mixfix::{Algebra, Fixity, Operator};

/// Loosest tier first: grouping, then the ternary, comparison, additive and
/// multiplicative tiers.
fn calculator() -> Algebra<f64> {
    Algebra::new([
        Operator::circumfix("(", ")", |r, ops| ops[0].evaluate(r)),
        Operator::new(Fixity::Infix, ["?", ":"], |r, ops| {
            if ops[0].evaluate(r)? != 0.0 {
                ops[1].evaluate(r)
            } else {
                ops[2].evaluate(r)
            }
        }),
        Operator::infix("<", |r, ops| {
            Ok(if ops[0].evaluate(r)? < ops[1].evaluate(r)? {
                1.0
            } else {
                0.0
            })
        }),
        Operator::infix("+", |r, ops| {
            Ok(ops[0].evaluate(r)? + ops[1].evaluate(r)?)
        }),
        Operator::infix("-", |r, ops| {
            Ok(ops[0].evaluate(r)? - ops[1].evaluate(r)?)
        }),
        Operator::infix("*", |r, ops| {
            Ok(ops[0].evaluate(r)? * ops[1].evaluate(r)?)
        }),
        Operator::infix("/", |r, ops| {
            Ok(ops[0].evaluate(r)? / ops[1].evaluate(r)?)
        }),
    ])
}

fn main() {
    let algebra = calculator();

    let env = |name: &str| -> f64 {
        match name {
            "pi" => std::f64::consts::PI,
            "deposit" => 1250.0,
            "rate" => 0.035,
            other => other.parse().unwrap_or(0.0),
        }
    };

    let inputs = [
        "1 + 2 * 3",
        "( 1 + 2 ) * 3",
        "2 * pi",
        "deposit * rate",
        "deposit * rate < 50 ? 50 : deposit * rate",
        "100 / ( 3 + 2 )",
        "deposit + ", // malformed on purpose
    ];

    for text in inputs {
        match algebra.parse(text) {
            Ok(expr) => match expr.evaluate(Some(&env)) {
                Ok(value) => println!("{text:40} => {expr} = {value}"),
                Err(e) => println!("{text:40} => {e}"),
            },
            Err(e) => {
                println!("{text}");
                println!("{}^ {} (byte {})", " ".repeat(e.offset), e.message, e.offset);
            }
        }
    }

    // Identifiers are opaque until evaluation, so the variable walk reports
    // numeric literals too; the resolver is what tells them apart.
    if let Some(expr) = algebra.try_parse("deposit * rate < 50 ? 50 : 0") {
        println!("\nidentifiers in {expr:?}:");
        println!("  {:?}", expr.variables());
    }

    // Arbitrary text survives as a single identifier once escaped.
    let quoted = algebra.escape_where_necessary("net (after fees)");
    println!("\nescaped: {quoted}");
    match algebra.parse(&quoted) {
        Ok(expr) => println!("parsed back as: {expr:?}"),
        Err(e) => println!("failed: {e}"),
    }
}
