//! Terminal output for the polling client: a spinner while the job is
//! pending and coloured lines for each status change and the final result.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::polling::{ObserverError, StatusObserver};
use crate::status::{JobStatus, StatusResponse};

/// Spinner that doubles as the CLI's status observer.
pub struct StatusProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl StatusProgress {
    pub fn start(target: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(format!("Polling {target}"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    fn style_for(&self, status: JobStatus) -> &Style {
        match status {
            JobStatus::Pending => &self.yellow,
            JobStatus::Completed => &self.green,
            JobStatus::Error => &self.red,
        }
    }

    /// Clears the spinner and prints the terminal status.
    pub fn finish(&self, response: &StatusResponse) {
        self.pb.finish_and_clear();
        if response.status == JobStatus::Completed {
            println!(
                "  {} Translation completed after {:.3}s",
                self.green.apply_to("✓"),
                response.elapsed_time
            );
        } else {
            println!(
                "  {} Translation failed after {:.3}s: {}",
                self.red.apply_to("✗"),
                response.elapsed_time,
                response.message.as_deref().unwrap_or("no details")
            );
        }
    }

    /// Clears the spinner without printing anything.
    pub fn abandon(&self) {
        self.pb.finish_and_clear();
    }
}

impl StatusObserver for StatusProgress {
    fn on_status_change(&self, response: &StatusResponse) -> Result<(), ObserverError> {
        let style = self.style_for(response.status);
        self.pb.println(format!(
            "  {} Status changed to {} (elapsed {:.3}s)",
            style.apply_to("●"),
            style.apply_to(response.status),
            response.elapsed_time
        ));
        self.pb.set_message(format!("Job {}", response.status));
        Ok(())
    }
}
