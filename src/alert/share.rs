//! Share fallback chain
//!
//! Channels are tried in order, typically the platform share sheet first,
//! then SMS deep links, then the clipboard. An unavailable or failing channel
//! falls through to the next one. A user cancellation ends the chain.

use super::{compose_sos_message, sms_link, Contact, GeoPoint};
use crate::error::ShareError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Content to share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ShareRequest {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The SOS alert for the given location. The maps link is part of the
    /// text, so no separate url is attached.
    pub fn sos(location: Option<&GeoPoint>) -> Self {
        Self::new("Emergency SOS", compose_sos_message(location))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    /// Platform share sheet, supplied by the host
    Native,
    Sms,
    Clipboard,
}

impl ShareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareKind::Native => "native",
            ShareKind::Sms => "sms",
            ShareKind::Clipboard => "clipboard",
        }
    }
}

impl std::fmt::Display for ShareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a channel did with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareReceipt {
    pub kind: ShareKind,
    /// Per-recipient links handed off, if the channel produces any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

/// One way of getting an alert off the device
pub trait ShareChannel {
    fn kind(&self) -> ShareKind;

    fn is_available(&self) -> bool {
        true
    }

    /// Deliver the request. Return `ShareError::Cancelled` only when the user
    /// backed out; any other error lets the chain try the next channel.
    fn deliver(
        &mut self,
        request: &ShareRequest,
        contacts: &[Contact],
    ) -> Result<ShareReceipt, ShareError>;
}

fn write_failed(kind: ShareKind, e: std::io::Error) -> ShareError {
    ShareError::Failed {
        channel: kind.to_string(),
        message: e.to_string(),
    }
}

/// Opens one `sms:` link per contact by writing it to a link handler.
/// All links go out in a single write, so a failed write never leaves the
/// handler with only some of the contacts.
pub struct SmsLinkChannel<W: Write> {
    out: W,
}

impl<W: Write> SmsLinkChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ShareChannel for SmsLinkChannel<W> {
    fn kind(&self) -> ShareKind {
        ShareKind::Sms
    }

    fn deliver(
        &mut self,
        request: &ShareRequest,
        contacts: &[Contact],
    ) -> Result<ShareReceipt, ShareError> {
        let recipients: Vec<&Contact> = contacts
            .iter()
            .filter(|c| !c.phone.trim().is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(ShareError::NoRecipients);
        }

        let links: Vec<String> = recipients
            .iter()
            .map(|contact| sms_link(&contact.phone, &request.text))
            .collect();
        let mut batch = String::new();
        for link in &links {
            batch.push_str(link);
            batch.push('\n');
        }

        self.out
            .write_all(batch.as_bytes())
            .and_then(|_| self.out.flush())
            .map_err(|e| write_failed(self.kind(), e))?;
        for contact in &recipients {
            debug!("Opened SMS link for {}", contact.name);
        }

        Ok(ShareReceipt {
            kind: self.kind(),
            links,
        })
    }
}

/// Last resort: copies the alert as plain text
pub struct ClipboardChannel<W: Write> {
    clipboard: W,
}

impl<W: Write> ClipboardChannel<W> {
    pub fn new(clipboard: W) -> Self {
        Self { clipboard }
    }

    pub fn into_inner(self) -> W {
        self.clipboard
    }
}

impl<W: Write> ShareChannel for ClipboardChannel<W> {
    fn kind(&self) -> ShareKind {
        ShareKind::Clipboard
    }

    fn deliver(
        &mut self,
        request: &ShareRequest,
        _contacts: &[Contact],
    ) -> Result<ShareReceipt, ShareError> {
        write!(
            self.clipboard,
            "{}\n{}\n{}",
            request.title,
            request.text,
            request.url.as_deref().unwrap_or("")
        )
        .and_then(|_| self.clipboard.flush())
        .map_err(|e| write_failed(self.kind(), e))?;

        Ok(ShareReceipt {
            kind: self.kind(),
            links: Vec::new(),
        })
    }
}

/// Ordered list of share channels
#[derive(Default)]
pub struct ShareChain {
    channels: Vec<Box<dyn ShareChannel + Send>>,
}

impl ShareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel<C>(mut self, channel: C) -> Self
    where
        C: ShareChannel + Send + 'static,
    {
        self.push(channel);
        self
    }

    pub fn push<C>(&mut self, channel: C)
    where
        C: ShareChannel + Send + 'static,
    {
        self.channels.push(Box::new(channel));
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Try each available channel in order until one delivers
    pub fn dispatch(
        &mut self,
        request: &ShareRequest,
        contacts: &[Contact],
    ) -> Result<ShareReceipt, ShareError> {
        for channel in self.channels.iter_mut() {
            let kind = channel.kind();
            if !channel.is_available() {
                debug!("Share channel {} unavailable, skipping", kind);
                continue;
            }

            match channel.deliver(request, contacts) {
                Ok(receipt) => {
                    info!("Alert shared via {}", kind);
                    return Ok(receipt);
                }
                Err(ShareError::Cancelled) => {
                    info!("Share cancelled by user on {}", kind);
                    return Err(ShareError::Cancelled);
                }
                Err(e) => warn!("Share via {} failed, trying next channel: {}", kind, e),
            }
        }

        warn!("No share channel could deliver the alert");
        Err(ShareError::Unsupported)
    }
}

impl std::fmt::Debug for ShareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<ShareKind> = self.channels.iter().map(|c| c.kind()).collect();
        f.debug_struct("ShareChain").field("channels", &kinds).finish()
    }
}
