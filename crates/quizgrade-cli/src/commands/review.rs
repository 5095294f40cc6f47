//! The `quizgrade review` command.

use std::path::PathBuf;

use anyhow::Result;

use quizgrade_core::report::SubmissionReport;

pub fn execute(
    report_path: PathBuf,
    question_id: String,
    points: f64,
    feedback: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let report = SubmissionReport::load_json(&report_path)?;
    let updated = report.with_manual_score(&question_id, points, feedback)?;

    let target = output.unwrap_or(report_path);
    updated.save_json(&target)?;

    println!(
        "Recorded {points:.2} points for '{question_id}' ({} still pending)",
        updated.summary.pending_count
    );
    match updated.summary.final_percentage {
        Some(pct) => println!("Final: {pct:.1}%"),
        None => println!("Final: pending"),
    }
    println!("Report saved to: {}", target.display());

    Ok(())
}
