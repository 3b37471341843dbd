use crate::protocol::Reply;

/// Replies and payload of one transfer command.
#[derive(Debug, Clone, Default)]
pub struct TransferOutcome {
    pub replies: Vec<Reply>,
    /// Bytes received for LIST and RETR; empty for STOR.
    pub data: Vec<u8>,
}

impl TransferOutcome {
    pub fn codes(&self) -> Vec<u16> {
        self.replies.iter().map(|r| r.code).collect()
    }

    /// Whether the transfer ended with 226.
    pub fn completed(&self) -> bool {
        self.replies.last().is_some_and(|r| r.code == 226)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_looks_at_the_last_reply() {
        let mut outcome = TransferOutcome::default();
        assert!(!outcome.completed());
        outcome.replies.push(Reply::new(227, "Entering Passive Mode (127,0,0,1,4,1)"));
        outcome.replies.push(Reply::new(150, "Opening data connection."));
        assert!(!outcome.completed());
        outcome.replies.push(Reply::new(226, "Transfer complete."));
        assert!(outcome.completed());
        assert_eq!(outcome.codes(), vec![227, 150, 226]);
    }
}
