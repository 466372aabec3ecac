//! Colour-tagged status lines for the operator, kept apart from the log stream.

use crossterm::style::{style, Stylize};

pub use crossterm::style::Color;

pub fn log(message: &str, color: Color) {
    println!("{}", format_line(message, color));
}

fn format_line(message: &str, color: Color) -> String {
    style(message).with(color).to_string()
}
