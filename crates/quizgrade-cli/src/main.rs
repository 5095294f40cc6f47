//! quizgrade CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizgrade", version, about = "Quiz validation and grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate quiz files
    Validate {
        /// Path to a quiz file (.toml or .json) or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Grade a submission against a quiz
    Grade {
        /// Path to the quiz file
        #[arg(long)]
        quiz: PathBuf,

        /// Path to the submission JSON
        #[arg(long)]
        submission: PathBuf,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Max questions graded concurrently (overrides config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Per test-case time limit in seconds (overrides config)
        #[arg(long)]
        test_timeout: Option<u64>,

        /// Score matching, dropdown and fill-blank questions all-or-nothing
        #[arg(long)]
        all_or_nothing: bool,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Do not write the report to disk
        #[arg(long)]
        no_save: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Record an instructor's score for a question pending review
    Review {
        /// Path to a saved report JSON
        #[arg(long)]
        report: PathBuf,

        /// Question to score
        #[arg(long)]
        question: String,

        /// Points awarded
        #[arg(long)]
        points: f64,

        /// Feedback for the student
        #[arg(long)]
        feedback: Option<String>,

        /// Where to write the updated report (defaults to overwriting it)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the truth table of a boolean expression
    TruthTable {
        /// Expression text, e.g. "A AND NOT B"
        #[arg(long)]
        expression: String,

        /// Variable order (comma-separated, defaults to order of appearance)
        #[arg(long)]
        variables: Option<String>,

        /// Render with symbols instead of keywords
        #[arg(long)]
        symbolic: bool,
    },

    /// Create a starter config and example quiz
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quizgrade=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Grade {
            quiz,
            submission,
            output,
            parallelism,
            test_timeout,
            all_or_nothing,
            json,
            no_save,
            config,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                quiz,
                submission,
                output,
                parallelism,
                test_timeout,
                all_or_nothing,
                json,
                save: !no_save,
                config,
            })
            .await
        }
        Commands::Review {
            report,
            question,
            points,
            feedback,
            output,
        } => commands::review::execute(report, question, points, feedback, output),
        Commands::TruthTable {
            expression,
            variables,
            symbolic,
        } => commands::truth_table::execute(expression, variables, symbolic),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
