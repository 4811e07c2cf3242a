//! Name-conflict resolution.
//!
//! When an upload's name is already taken, the resolver asks the UI what to
//! do. Each prompt is a [`ConflictRequest`] carrying a oneshot reply; the UI
//! answers with keep-both (under a new name), replace, or cancel. An invalid
//! keep-both name reopens the prompt with a warning.

use std::sync::Mutex;

use swarmdesk_transfer::validate_file_name;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// A prompt for the UI.
#[derive(Debug)]
pub struct ConflictRequest {
    pub original_name: String,
    pub existing_names: Vec<String>,
    pub suggested_name: String,
    /// Why the previous answer was rejected.
    pub warning: Option<String>,
    /// Whether a drive file with this name exists to be replaced. Names
    /// that only collide with pending uploads can only be kept or skipped.
    pub can_replace: bool,
    pub reply: oneshot::Sender<ConflictAnswer>,
}

/// The UI's answer to a [`ConflictRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictAnswer {
    KeepBoth(String),
    Replace,
    Cancel,
}

/// Final outcome for one conflicting file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    KeepBoth { name: String },
    Replace,
    Cancel,
}

/// Where the resolver is in the current (or last) conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictState {
    Idle,
    Prompting { attempt: u32 },
    Resolved(ConflictResolution),
}

pub struct ConflictResolver {
    tx: mpsc::Sender<ConflictRequest>,
    rx: Mutex<Option<mpsc::Receiver<ConflictRequest>>>,
    max_prompts: u32,
    state: Mutex<ConflictState>,
}

impl ConflictResolver {
    pub fn new(max_prompts: u32) -> Self {
        let (tx, rx) = mpsc::channel(16);
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            max_prompts,
            state: Mutex::new(ConflictState::Idle),
        }
    }

    /// Takes the prompt receiver. Can only be called once.
    pub fn take_requests(&self) -> Option<mpsc::Receiver<ConflictRequest>> {
        self.rx.lock().unwrap().take()
    }

    pub fn state(&self) -> ConflictState {
        self.state.lock().unwrap().clone()
    }

    /// Prompts until the UI gives an acceptable answer.
    ///
    /// Resolves to Cancel when no UI holds the receiver, when the UI drops
    /// a reply, or after `max_prompts` rejected answers.
    pub async fn resolve(
        &self,
        original_name: &str,
        existing_names: &[String],
        can_replace: bool,
    ) -> ConflictResolution {
        if self.rx.lock().unwrap().is_some() {
            warn!(name = %original_name, "name conflict with no prompt listener, skipping file");
            return self.finish(ConflictResolution::Cancel);
        }

        let suggested_name = suggest_unique_name(original_name, existing_names);
        let mut warning = None;
        for attempt in 1..=self.max_prompts {
            self.set_state(ConflictState::Prompting { attempt });
            let (reply, answer) = oneshot::channel();
            let request = ConflictRequest {
                original_name: original_name.to_string(),
                existing_names: existing_names.to_vec(),
                suggested_name: suggested_name.clone(),
                warning: warning.take(),
                can_replace,
                reply,
            };
            if self.tx.send(request).await.is_err() {
                debug!(name = %original_name, "prompt listener gone");
                return self.finish(ConflictResolution::Cancel);
            }

            match answer.await.unwrap_or(ConflictAnswer::Cancel) {
                ConflictAnswer::Cancel => return self.finish(ConflictResolution::Cancel),
                ConflictAnswer::Replace if can_replace => {
                    return self.finish(ConflictResolution::Replace);
                }
                ConflictAnswer::Replace => {
                    warning = Some(format!(
                        "{original_name} is still uploading and cannot be replaced yet"
                    ));
                }
                ConflictAnswer::KeepBoth(name) => match check_new_name(&name, existing_names) {
                    Ok(name) => return self.finish(ConflictResolution::KeepBoth { name }),
                    Err(reason) => warning = Some(reason),
                },
            }
        }

        warn!(name = %original_name, prompts = self.max_prompts, "conflict unresolved, skipping file");
        self.finish(ConflictResolution::Cancel)
    }

    fn set_state(&self, state: ConflictState) {
        *self.state.lock().unwrap() = state;
    }

    fn finish(&self, resolution: ConflictResolution) -> ConflictResolution {
        self.set_state(ConflictState::Resolved(resolution.clone()));
        resolution
    }
}

fn check_new_name(name: &str, existing: &[String]) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Enter a file name.".into());
    }
    validate_file_name(name).map_err(|e| e.to_string())?;
    if has_conflict(name, existing) {
        return Err(format!("{name} already exists."));
    }
    Ok(name.to_string())
}

/// Exact display-name comparison.
pub fn has_conflict(name: &str, existing: &[String]) -> bool {
    existing.iter().any(|e| e == name)
}

/// First free `"stem (n).ext"` variant of `name`.
pub fn suggest_unique_name(name: &str, existing: &[String]) -> String {
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };
    (1u64..)
        .map(|n| format!("{stem} ({n}){ext}"))
        .find(|candidate| !has_conflict(candidate, existing))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suggestions() {
        let existing = names(&["report.pdf"]);
        assert_eq!(suggest_unique_name("report.pdf", &existing), "report (1).pdf");

        let existing = names(&["report.pdf", "report (1).pdf"]);
        assert_eq!(suggest_unique_name("report.pdf", &existing), "report (2).pdf");

        assert_eq!(suggest_unique_name("README", &names(&["README"])), "README (1)");
        assert_eq!(suggest_unique_name(".env", &names(&[".env"])), ".env (1)");
        assert_eq!(
            suggest_unique_name("a.tar.gz", &names(&["a.tar.gz"])),
            "a.tar (1).gz"
        );
    }

    #[test]
    fn conflict_is_exact() {
        let existing = names(&["Report.pdf"]);
        assert!(has_conflict("Report.pdf", &existing));
        assert!(!has_conflict("report.pdf", &existing));
    }

    #[tokio::test]
    async fn keep_both_with_suggestion() {
        let resolver = ConflictResolver::new(8);
        let mut requests = resolver.take_requests().unwrap();
        let ui = tokio::spawn(async move {
            let req = requests.recv().await.unwrap();
            assert_eq!(req.suggested_name, "report (1).pdf");
            assert!(req.warning.is_none());
            req.reply.send(ConflictAnswer::KeepBoth(req.suggested_name.clone())).unwrap();
        });

        let res = resolver
            .resolve("report.pdf", &names(&["report.pdf"]), true)
            .await;
        ui.await.unwrap();
        assert_eq!(
            res,
            ConflictResolution::KeepBoth {
                name: "report (1).pdf".into()
            }
        );
        assert_eq!(resolver.state(), ConflictState::Resolved(res));
    }

    #[tokio::test]
    async fn taken_name_reprompts_with_warning() {
        let resolver = ConflictResolver::new(8);
        let mut requests = resolver.take_requests().unwrap();
        let ui = tokio::spawn(async move {
            let first = requests.recv().await.unwrap();
            first.reply.send(ConflictAnswer::KeepBoth("report.pdf".into())).unwrap();
            let second = requests.recv().await.unwrap();
            assert!(second.warning.is_some());
            second.reply.send(ConflictAnswer::Replace).unwrap();
        });

        let res = resolver
            .resolve("report.pdf", &names(&["report.pdf"]), true)
            .await;
        ui.await.unwrap();
        assert_eq!(res, ConflictResolution::Replace);
    }

    #[tokio::test]
    async fn replace_needs_a_drive_file() {
        let resolver = ConflictResolver::new(2);
        let mut requests = resolver.take_requests().unwrap();
        let ui = tokio::spawn(async move {
            while let Some(req) = requests.recv().await {
                assert!(!req.can_replace);
                let _ = req.reply.send(ConflictAnswer::Replace);
            }
        });

        let res = resolver.resolve("a.txt", &names(&["a.txt"]), false).await;
        assert_eq!(res, ConflictResolution::Cancel);
        drop(resolver);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn gives_up_after_max_prompts() {
        let resolver = ConflictResolver::new(3);
        let mut requests = resolver.take_requests().unwrap();
        let ui = tokio::spawn(async move {
            let mut prompts = 0;
            while let Some(req) = requests.recv().await {
                prompts += 1;
                let _ = req.reply.send(ConflictAnswer::KeepBoth(String::new()));
            }
            prompts
        });

        let res = resolver.resolve("a.txt", &names(&["a.txt"]), true).await;
        assert_eq!(res, ConflictResolution::Cancel);
        drop(resolver);
        assert_eq!(ui.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn dropped_reply_cancels() {
        let resolver = ConflictResolver::new(8);
        let mut requests = resolver.take_requests().unwrap();
        let ui = tokio::spawn(async move {
            let req = requests.recv().await.unwrap();
            drop(req);
        });
        let res = resolver.resolve("a.txt", &names(&["a.txt"]), true).await;
        ui.await.unwrap();
        assert_eq!(res, ConflictResolution::Cancel);
    }

    #[tokio::test]
    async fn no_listener_cancels() {
        let resolver = ConflictResolver::new(8);
        let res = resolver.resolve("a.txt", &names(&["a.txt"]), true).await;
        assert_eq!(res, ConflictResolution::Cancel);

        let requests = resolver.take_requests().unwrap();
        drop(requests);
        let res = resolver.resolve("a.txt", &names(&["a.txt"]), true).await;
        assert_eq!(res, ConflictResolution::Cancel);
    }
}
