// Terminal driver for a diagnosis session against the configured backend.
//
// Commands: `/restart` starts over, `/history` lists archived sessions,
// `/quit` exits. Anything else is sent as the answer to the current prompt.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use symptom_session_lib::config::{self, BackendConfig};
use symptom_session_lib::dialogue::{
    quick_replies, InputDescriptor, SessionController, SessionError, SeverityBand, TurnOutcome,
};
use symptom_session_lib::history::SessionHistory;
use symptom_session_lib::transport::HttpBackend;

fn main() -> ExitCode {
    symptom_session_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let backend_config = match BackendConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let backend = match HttpBackend::new(&backend_config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Could not create HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let history_path = config::history_path();
    let history = SessionHistory::load(&history_path).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable session history");
        SessionHistory::new()
    });
    let mut controller = SessionController::with_history(history);

    match controller.start(&backend, None) {
        Ok(_) => print_latest(&controller),
        Err(e) => report_error(&e),
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print_prompt(&controller);
        let Some(Ok(line)) = lines.next() else { break };
        let line = line.trim();

        match line {
            "/quit" => break,
            "/restart" => match controller.restart(&backend, None) {
                Ok(_) => print_latest(&controller),
                Err(e) => report_error(&e),
            },
            "/history" => print_history(controller.history()),
            answer => match controller.submit(&backend, answer) {
                Ok(TurnOutcome::Continued { .. }) => print_latest(&controller),
                Ok(TurnOutcome::Completed { .. }) => {
                    print_latest(&controller);
                    println!("Session complete. Type /restart to begin again.");
                }
                Ok(TurnOutcome::Discarded) => {}
                Err(e) => report_error(&e),
            },
        }
    }

    if let Err(e) = controller.history().save(&history_path) {
        tracing::warn!(error = %e, "Failed to save session history");
    }
    ExitCode::SUCCESS
}

fn print_latest(controller: &SessionController) {
    let Some(transcript) = controller.transcript() else {
        return;
    };
    // The completing turn adds the reply and the formatted diagnosis.
    let take = if controller.session().is_some_and(|s| s.is_complete()) {
        2
    } else {
        1
    };
    let skip = transcript.len().saturating_sub(take);
    for message in transcript.iter().skip(skip) {
        println!("\n{}", message.text());
    }
}

fn print_prompt(controller: &SessionController) {
    match controller.current_input() {
        Some(InputDescriptor::NumericSlider {
            min, max, bands, ..
        }) => println!("{}", slider_legend(min, max, &bands)),
        Some(descriptor) => {
            let options = quick_replies(&descriptor);
            if !options.is_empty() {
                println!("[{}]", options.join(" / "));
            }
        }
        None => {}
    }
    print!("> ");
    let _ = io::stdout().flush();
}

fn slider_legend(min: u8, max: u8, bands: &[SeverityBand]) -> String {
    let bands: Vec<String> = bands
        .iter()
        .map(|b| format!("{}-{} {}", b.min, b.max, b.label))
        .collect();
    format!("[{min}-{max}] {}", bands.join(", "))
}

fn print_history(history: &SessionHistory) {
    if history.is_empty() {
        println!("No archived sessions.");
        return;
    }
    for entry in history.list() {
        let outcome = entry.top_diagnosis.as_deref().unwrap_or("incomplete");
        println!(
            "{}  {}  ({})",
            entry.started_at.format("%Y-%m-%d %H:%M"),
            entry.title,
            outcome
        );
    }
}

fn report_error(error: &SessionError) {
    eprintln!("{error}");
    if error.needs_authentication() {
        eprintln!("Please sign in to continue.");
    }
}
