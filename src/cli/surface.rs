//! Plain terminal rendering of the kiosk view.

use photobooth_kiosk::kiosk::Surface;
use photobooth_kiosk::view::View;

/// Prints each distinct view once, alerts on stderr.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    last: Option<View>,
}

impl Surface for TerminalSurface {
    fn render(&mut self, view: &View) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        println!();
        println!("{}", view);
        self.last = Some(view.clone());
    }

    fn alert(&mut self, message: &str) {
        eprintln!();
        eprintln!("!! {}", message.replace('\n', "\n!! "));
    }

    fn notice(&mut self, message: &str) {
        println!("-- {}", message);
    }
}
