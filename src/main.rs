use ming800_scraper::logging::{init_logging, parse_log_level, LoggerConfig};
use ming800_scraper::utils::{self, is_valid_mobile_phone_number};
use ming800_scraper::{log_error, log_info, log_warn};
use ming800_scraper::{Class, Config, Result, Session, Student, WalkHandler, Walker};
use serde::Serialize;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Serialize)]
struct MalformedPhoneNumber {
    class: String,
    student_id: String,
    student: String,
    phone_number: String,
}

/// Collects every student whose phone number is not a valid mobile number.
/// A student enrolled in several classes is reported once.
#[derive(Default)]
struct PhoneAuditor {
    seen: HashSet<String>,
    malformed: Vec<MalformedPhoneNumber>,
}

impl WalkHandler for PhoneAuditor {
    fn on_class(&mut self, class: &Class) -> anyhow::Result<()> {
        log_info!(
            "[audit] Class {} ({}), teachers: {}",
            class.name,
            class.category.name,
            class.teachers.join(", ")
        );
        Ok(())
    }

    fn on_student(&mut self, class: &Class, student: &Student) -> anyhow::Result<()> {
        if !self.seen.insert(student.id.clone()) {
            return Ok(());
        }
        if !is_valid_mobile_phone_number(&student.phone_number) {
            log_warn!(
                "[audit] {} / {}: malformed phone number {:?}",
                class.name,
                student.name,
                student.phone_number
            );
            self.malformed.push(MalformedPhoneNumber {
                class: class.name.clone(),
                student_id: student.id.clone(),
                student: student.name.clone(),
                phone_number: student.phone_number.clone(),
            });
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::from_file(&path)?;

    let logger_config = LoggerConfig {
        directory: config.logging.directory.clone(),
        file_name: config.logging.filename.clone(),
        level: parse_log_level(&config.logging.level)?,
        ..Default::default()
    };
    init_logging(logger_config)?;

    log_info!("[main] Auditing phone numbers on {}", config.server_url);

    let mut session = Session::with_client(config.session(), config.client()?)?;
    session.login().await?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_warn!("[main] Interrupted, stopping walk...");
            ctrl_c.cancel();
        }
    });

    let mut auditor = PhoneAuditor::default();
    let outcome = Walker::new(&session)
        .with_options(config.walk_options())
        .with_cancel(cancel)
        .walk(&mut auditor)
        .await;

    // Whatever the walk did, end the server-side session.
    session.logout().await?;

    let summary = match outcome {
        Ok(summary) => summary,
        Err(e) => {
            log_error!(e => "[main] Walk failed");
            return Err(e);
        }
    };

    utils::save_json(&auditor.malformed, &config.report)?;
    log_info!(
        "[main] Walked {} classes and {} students; {} malformed phone numbers saved to {}",
        summary.classes,
        summary.students,
        auditor.malformed.len(),
        config.report
    );

    Ok(())
}
