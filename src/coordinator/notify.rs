//! Notification support for merge events.
//!
//! Downstream notification is fire-and-forget: the dispatcher logs delivery
//! failures and moves on, since a notification can never affect an already
//! committed merge. Desktop delivery uses notify-send on Linux and osascript
//! on macOS.

use anyhow::{bail, Context, Result};
use std::process::Command;

use crate::models::request::MergeRequest;

/// Merge lifecycle events worth telling a human about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeEvent {
    Merged,
    MergeFailed,
}

impl MergeEvent {
    fn title(&self) -> &'static str {
        match self {
            MergeEvent::Merged => "Merge request merged",
            MergeEvent::MergeFailed => "Merge request failed",
        }
    }
}

/// Downstream notifier interface.
pub trait Notifier {
    fn notify(&self, event: MergeEvent, request: &MergeRequest) -> Result<()>;
}

/// Notifier that only writes to the log. Used when desktop notifications
/// are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: MergeEvent, request: &MergeRequest) -> Result<()> {
        tracing::info!(
            request = %request.to_reference(),
            source = %request.source_branch,
            target = %request.target_branch,
            "{}",
            event.title()
        );
        Ok(())
    }
}

/// Desktop notifier using platform notification tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, event: MergeEvent, request: &MergeRequest) -> Result<()> {
        let body = format!(
            "{}: {} -> {}",
            request.to_reference(),
            request.source_branch,
            request.target_branch
        );

        if cfg!(target_os = "macos") {
            send_macos_notification(event.title(), &body)
        } else {
            send_linux_notification(event.title(), &body)
        }
    }
}

fn send_linux_notification(title: &str, body: &str) -> Result<()> {
    let output = Command::new("notify-send")
        .arg("--app-name=mergectl")
        .arg(title)
        .arg(body)
        .output()
        .context("notify-send failed")?;

    if !output.status.success() {
        bail!("notify-send exited with: {}", output.status);
    }
    Ok(())
}

fn send_macos_notification(title: &str, body: &str) -> Result<()> {
    let script = format!(
        r#"display notification "{}" with title "{}""#,
        body.replace('"', r#"\""#),
        title.replace('"', r#"\""#)
    );

    let output = Command::new("osascript")
        .arg("-e")
        .arg(&script)
        .output()
        .context("osascript failed")?;

    if !output.status.success() {
        bail!("osascript exited with: {}", output.status);
    }
    Ok(())
}
