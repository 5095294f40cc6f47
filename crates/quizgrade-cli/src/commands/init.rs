//! The `quizgrade init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizgrade.toml").exists() {
        println!("quizgrade.toml already exists, skipping.");
    } else {
        std::fs::write("quizgrade.toml", SAMPLE_CONFIG)?;
        println!("Created quizgrade.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = std::path::Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizgrade.toml to point at your language toolchains");
    println!("  2. Run: quizgrade validate --quiz quizzes/example.toml");
    println!("  3. Run: quizgrade grade --quiz quizzes/example.toml --submission answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizgrade configuration

parallelism = 4
test_timeout_secs = 10
scoring = "partial_credit"
output_dir = "./quizgrade-reports"

[runners.python]
command = "python3"
args = ["{file}"]
file_name = "main.py"

[runners.javascript]
command = "node"
args = ["{file}"]
file_name = "main.js"

[runners.shell]
command = "sh"
args = ["{file}"]
file_name = "main.sh"
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = "example"
title = "Example Quiz"
description = "A short quiz to get started"

[quiz.weights]
sum = 2.0

[[questions]]
id = "gc"
type = "true_false"
text = "Rust uses a tracing garbage collector."
points = 1

[questions.data]
correct_answer = false

[[questions]]
id = "boiling"
type = "numerical"
text = "At what temperature does water boil at sea level?"
points = 2

[questions.data]
correct_answer = 100.0
tolerance = 0.5
units = "C"

[[questions]]
id = "sum"
type = "coding"
text = "Read two integers from stdin and print their sum."
points = 4

[questions.data]
language = "python"
starter_code = "a, b = map(int, input().split())\n"

[[questions.data.test_cases]]
id = "small"
input = "2 3\n"
expected_output = "5"

[[questions.data.test_cases]]
id = "negative"
input = "-4 1\n"
expected_output = "-3"
hidden = true
"#;
