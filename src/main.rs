//! Terminal front end for AyushLens.

use ayushlens::logging::{LogLevel, init_logging};
use ayushlens::session::DASHBOARD_RECENT;
use ayushlens::{
    AnalysisClient, FileImageSource, FileReportStore, GeminiClient, LensConfig, Notice,
    SessionController, SymptomReport, View,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::error;

type Session = SessionController<GeminiClient, FileReportStore>;

const HELP: &str = "\
Commands:
  new                 start a new analysis
  photo <path>        attach a JPEG photo to the analysis
  clear-photo         remove the attached photo
  analyze <symptoms>  describe symptoms and run the analysis
  history             list all reports
  open <n>            show report number n from the last list
  back                return to the dashboard
  help                show this help
  quit                exit";

#[tokio::main]
async fn main() {
    init_logging(LogLevel::Warn);

    let config = match LensConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let model = match config.gemini_client() {
        Ok(model) => model,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let analysis = AnalysisClient::new(model)
        .deadline(config.timeout)
        .primary_condition_policy(config.primary_policy);
    let store = FileReportStore::new(config.store_path.clone());
    let mut session = SessionController::open(analysis, store).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    if let Err(e) = run(&mut session, &mut lines).await {
        error!(error = %e, "Terminal I/O failed");
        std::process::exit(1);
    }
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> std::io::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

async fn run(session: &mut Session, lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<()> {
    println!("AyushLens - AI Symptom Correlation Engine");
    println!("Not professional medical advice.\n");

    while session.username().is_none() {
        let Some(username) = prompt(lines, "Username: ").await? else {
            return Ok(());
        };
        let password = prompt(lines, "Password: ").await?.unwrap_or_default();
        if session.login(&username, &password).await.is_err() {
            print_notice(session);
        }
    }

    render(session);
    let mut listed: Vec<String> = session.recent_reports(DASHBOARD_RECENT).iter().map(|r| r.id.clone()).collect();

    loop {
        let Some(line) = prompt(lines, "> ").await? else {
            return Ok(());
        };
        let (command, arg) = match line.trim().split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line.trim(), ""),
        };

        let result = match command {
            "" => continue,
            "quit" | "exit" => return Ok(()),
            "help" => {
                println!("{}", HELP);
                continue;
            }
            "new" => session.start_new_analysis(),
            "photo" => {
                let source = FileImageSource::new(arg);
                session.capture_image(&source).await.map(|attached| {
                    if attached {
                        println!("Photo attached.");
                    }
                })
            }
            "clear-photo" => session.clear_image(),
            "analyze" => {
                let mut result = Ok(());
                if session.view() != &View::Composing {
                    result = session.start_new_analysis();
                }
                if result.is_ok() {
                    result = session.set_symptoms(arg);
                }
                if result.is_ok() {
                    println!("Correlating symptoms...");
                    result = session.submit().await.map(|_| ());
                }
                result
            }
            "history" => session.open_history(),
            "open" => match arg.parse::<usize>().ok().and_then(|n| listed.get(n.wrapping_sub(1))) {
                Some(id) => {
                    let id = id.clone();
                    session.open_report(&id)
                }
                None => {
                    println!("No report with that number.");
                    continue;
                }
            },
            "back" => session.back_to_dashboard(),
            other => {
                println!("Unknown command '{}'. Type 'help'.", other);
                continue;
            }
        };

        if result.is_err() || session.notice().is_some() {
            print_notice(session);
        }
        if result.is_ok() {
            render(session);
        }
        listed = match session.view() {
            View::History => session.reports().iter().map(|r| r.id.clone()).collect(),
            View::Dashboard => session.recent_reports(DASHBOARD_RECENT).iter().map(|r| r.id.clone()).collect(),
            _ => listed,
        };
    }
}

fn print_notice(session: &Session) {
    if let Some(notice) = session.notice() {
        match notice {
            Notice::SavedLocallyOnly => println!("Warning: {}", notice),
            _ => println!("{}", notice),
        }
    }
}

fn render(session: &Session) {
    match session.view() {
        View::LoggedOut => {}
        View::Dashboard => {
            println!("\nWelcome back, {}", session.username().unwrap_or_default());
            let recent = session.recent_reports(DASHBOARD_RECENT);
            if recent.is_empty() {
                println!("Your health history is empty. Type 'new' to start an analysis.");
            } else {
                println!("Recent analyses:");
                render_list(recent);
            }
        }
        View::Composing | View::Analyzing => {
            println!("\nNew correlation. Describe your symptoms with 'analyze <symptoms>'.");
            if session.attached_image().is_some() {
                println!("A photo is attached.");
            }
        }
        View::History => {
            println!("\nAnalysis history:");
            render_list(session.reports());
        }
        View::Details(_) => {
            if let Some(report) = session.selected_report() {
                render_details(report);
            }
        }
    }
}

fn render_list(reports: &[SymptomReport]) {
    for (i, report) in reports.iter().enumerate() {
        let (condition, severity) = match &report.analysis {
            Some(a) => (a.primary_condition.as_str(), a.severity.as_str()),
            None => ("No Analysis", "N/A"),
        };
        let when = report
            .created_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("  {:>2}. {} [{}] {} - {}", i + 1, condition, severity, when, report.symptoms);
    }
}

fn render_details(report: &SymptomReport) {
    println!("\nSymptoms: {}", report.symptoms);
    if report.image_url.is_some() {
        println!("Visual evidence attached.");
    }
    let Some(analysis) = &report.analysis else {
        println!("No analysis available.");
        return;
    };
    println!("Primary condition: {}", analysis.primary_condition);
    println!("Severity: {}", analysis.severity);
    println!("\n{}", analysis.summary);
    println!("\nCorrelation report:");
    for condition in &analysis.correlation_report {
        println!("  {:>3}%  {} - {}", condition.percent(), condition.name, condition.reason);
    }
    println!("\nRecommendations:");
    for recommendation in &analysis.recommendations {
        println!("  - {}", recommendation);
    }
    println!("\n{}", analysis.disclaimer);
}
