use swarmdesk_sdk::SdkError;

/// Default notice display duration in milliseconds.
const DEFAULT_DURATION_MS: u64 = 4000;

/// Error notice display duration in milliseconds.
const ERROR_DURATION_MS: u64 = 6000;

/// Severity of a snackbar notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeKind {
    fn default_duration_ms(self) -> u64 {
        match self {
            Self::Error => ERROR_DURATION_MS,
            _ => DEFAULT_DURATION_MS,
        }
    }
}

/// A snackbar message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub title: String,
    pub message: Option<String>,
    pub duration_ms: u64,
    /// Whether the UI should offer a retry action.
    pub retryable: bool,
}

/// FIFO queue of snackbar notices with monotonic ids.
///
/// Auto-dismissal timers belong to the UI; the queue only stores notices.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
    next_id: u64,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a notice with the kind's default duration. Returns its id.
    pub fn push(
        &mut self,
        kind: NoticeKind,
        title: impl Into<String>,
        message: Option<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.notices.push(Notice {
            id,
            kind,
            title: title.into(),
            message,
            duration_ms: kind.default_duration_ms(),
            retryable: false,
        });
        id
    }

    pub fn success(&mut self, title: impl Into<String>) -> u64 {
        self.push(NoticeKind::Success, title, None)
    }

    pub fn error(&mut self, title: impl Into<String>) -> u64 {
        self.push(NoticeKind::Error, title, None)
    }

    pub fn warning(&mut self, title: impl Into<String>) -> u64 {
        self.push(NoticeKind::Warning, title, None)
    }

    pub fn info(&mut self, title: impl Into<String>) -> u64 {
        self.push(NoticeKind::Info, title, None)
    }

    /// Reports an SDK failure under `title`.
    ///
    /// Cancellations are informational, not errors.
    pub fn sdk_error(&mut self, title: impl Into<String>, err: &SdkError) -> u64 {
        let kind = if err.is_cancelled() {
            NoticeKind::Info
        } else {
            NoticeKind::Error
        };
        let id = self.push(kind, title, Some(err.user_message().to_string()));
        if let Some(n) = self.notices.iter_mut().find(|n| n.id == id) {
            n.retryable = err.is_retryable();
        }
        id
    }

    /// The notice the snackbar should show now (oldest first).
    pub fn current(&self) -> Option<&Notice> {
        self.notices.first()
    }

    /// Removes a notice. Returns `true` if it was present.
    pub fn remove(&mut self, id: u64) -> bool {
        let len_before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != len_before
    }

    pub fn get(&self, id: u64) -> Option<&Notice> {
        self.notices.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}
