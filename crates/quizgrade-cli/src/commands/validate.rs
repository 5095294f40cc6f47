//! The `quizgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::parser;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quizzes = parser::load_quizzes(&quiz_path)?;
    anyhow::ensure!(
        !quizzes.is_empty(),
        "no quizzes found in {}",
        quiz_path.display()
    );

    let mut total_issues = 0;

    for quiz in &quizzes {
        println!("Quiz: {} ({} questions)", quiz.title, quiz.questions.len());

        let issues = parser::validate_quiz(quiz);
        for issue in &issues {
            let prefix = issue
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} ERROR: {}", issue.message);
        }
        total_issues += issues.len();
    }

    if total_issues == 0 {
        println!("All quizzes valid.");
        Ok(())
    } else {
        anyhow::bail!("{total_issues} issue(s) found")
    }
}
