//! Property-based tests for the task list wire contract.
//!
//! Uses proptest to verify:
//! 1. Text normalization is idempotent and never yields blank output.
//! 2. Accepted text always fits the character limit after trimming.
//! 3. Random bytes never cause a panic in the body decoders.
//! 4. Any list body survives encode → decode with its order intact.

use proptest::prelude::*;
use tasklist_proto::api::{TaskList, decode_error_body, decode_task_list};
use tasklist_proto::task::{MAX_TASK_TEXT_LENGTH, Task, TaskId, TextError, normalize_text};

/// Strategy for generating arbitrary `Task` values.
fn arb_task() -> impl Strategy<Value = Task> {
    (any::<i64>(), "[^\x00]{1,64}", any::<u64>())
        .prop_map(|(id, text, created_at)| Task::new(TaskId::new(id), text, created_at))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in "\\PC{0,300}") {
        if let Ok(once) = normalize_text(&raw, MAX_TASK_TEXT_LENGTH) {
            prop_assert_eq!(normalize_text(once, MAX_TASK_TEXT_LENGTH), Ok(once));
        }
    }

    #[test]
    fn accepted_text_is_trimmed_and_bounded(raw in "\\PC{0,300}") {
        match normalize_text(&raw, MAX_TASK_TEXT_LENGTH) {
            Ok(text) => {
                prop_assert!(!text.is_empty());
                prop_assert_eq!(text, text.trim());
                prop_assert!(text.chars().count() <= MAX_TASK_TEXT_LENGTH);
            }
            Err(TextError::Blank) => prop_assert!(raw.trim().is_empty()),
            Err(TextError::TooLong { max }) => {
                prop_assert!(raw.trim().chars().count() > max);
            }
        }
    }

    #[test]
    fn whitespace_only_is_always_blank(raw in "[ \t\r\n]{0,40}") {
        prop_assert_eq!(normalize_text(&raw, MAX_TASK_TEXT_LENGTH), Err(TextError::Blank));
    }

    #[test]
    fn random_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_task_list(&bytes);
        let _ = decode_error_body(&bytes);
    }

    #[test]
    fn list_body_preserves_order(tasks in prop::collection::vec(arb_task(), 0..16)) {
        let body = serde_json::to_vec(&TaskList { tasks: tasks.clone() }).unwrap();
        let decoded = decode_task_list(&body).unwrap();
        prop_assert_eq!(decoded.tasks, tasks);
    }
}
