use comfydock_core::backend::Notifier;
use console::Style;
use once_cell::sync::Lazy;

static SUCCESS_STYLE: Lazy<Style> = Lazy::new(|| Style::new().green().bold());
static ERROR_STYLE: Lazy<Style> = Lazy::new(|| Style::new().red().bold());

/// Notifier printing styled one-line messages to stderr, keeping stdout
/// clean for command output.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        eprintln!("{}", SUCCESS_STYLE.apply_to(message));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", ERROR_STYLE.apply_to(message));
    }
}
