// ============================================
// File: crates/cryptoserve-server/src/greeting.rs
// ============================================
//! # Greeting
//!
//! ## Creation Reason
//! The first message every peer receives: a boxed text menu describing
//! the service and listing the exercises by ordinal.
//!
//! ## Layout
//! ```text
//! ╭─ About ──────────────────────────────────────────────────────────╮
//! │ Cryptoserve is server software that hosts a library of ...       │
//! ╰──────────────────────────────────────────────────────────────────╯
//! ```
//! Every line is exactly `LINE_WIDTH` characters wide.
//!
//! ## Last Modified
//! v0.1.0 - Initial greeting

use cryptoserve_exercises::ExerciseRegistry;

/// Where the protocol of each exercise is documented.
pub const DOCUMENTATION_LINK: &str = "https://cryptoserve.readthedocs.io/";

/// Width of every rendered line, borders included.
pub const LINE_WIDTH: usize = 70;

const ABOUT: &str = "Cryptoserve is server software that hosts a library of \
cryptography-related exercises, designed to help students learn a broad range of \
cryptographic concepts through hands-on experimentation. Each exercise defines a \
protocol in which Cryptoserve controls one side of the interaction.";

/// Renders the greeting for `registry`.
#[must_use]
pub fn render(registry: &ExerciseRegistry) -> String {
    let usage = format!(
        "As the end user, YOU are responsible for implementing the other side of the \
         exchange in order to complete the challenge. To get started, send the number or \
         name of one of the exercises listed below. For more usage information, please \
         refer to the official documentation at {DOCUMENTATION_LINK}."
    );

    let exercises = registry
        .iter()
        .map(|d| format!("{}. {}", d.ordinal(), d.title()))
        .collect::<Vec<_>>()
        .join("\n");

    let sections = [
        ("Welcome to Cryptoserve!", DOCUMENTATION_LINK),
        ("About", ABOUT),
        ("Usage", usage.as_str()),
        ("Available Exercises", exercises.as_str()),
    ];

    sections
        .iter()
        .map(|(title, body)| boxed(title, body))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draws one titled box.
pub(crate) fn boxed(title: &str, body: &str) -> String {
    let inner = LINE_WIDTH - 4;
    let mut lines = Vec::new();

    let heading = format!("─ {title} ");
    let fill = (LINE_WIDTH - 2).saturating_sub(heading.chars().count());
    lines.push(format!("╭{heading}{}╮", "─".repeat(fill)));

    for paragraph in body.lines() {
        for line in wrap(paragraph, inner) {
            let pad = inner.saturating_sub(line.chars().count());
            lines.push(format!("│ {line}{} │", " ".repeat(pad)));
        }
    }

    lines.push(format!("╰{}╯", "─".repeat(LINE_WIDTH - 2)));
    lines.join("\n")
}

/// Greedy word wrap; words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_owned();

        while word.chars().count() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word.char_indices().nth(width).map_or(word.len(), |(i, _)| i);
            let rest = word.split_off(split);
            lines.push(word);
            word = rest;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
