use console::style;

use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::ui::icons::{CHECK, CROSS};

/// Prints notices to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => {
                println!("{} {}", CHECK, style(&notice.message).green().bold())
            }
            NoticeLevel::Error => {
                eprintln!("{} {}", CROSS, style(&notice.message).red().bold())
            }
        }
    }
}
