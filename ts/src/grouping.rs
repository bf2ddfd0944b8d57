//! Group prioritized tasks for display

use crate::types::{PrioritizedTask, Priority, TaskGroup};

/// Partition tasks by priority, High → Medium → Low
///
/// Relative order within each group follows the input. Empty groups are omitted.
pub fn group_tasks_by_priority(tasks: &[PrioritizedTask]) -> Vec<TaskGroup> {
    Priority::ALL
        .iter()
        .map(|&priority| TaskGroup {
            priority,
            tasks: tasks.iter().filter(|t| t.priority == priority).cloned().collect(),
        })
        .filter(|group| !group.tasks.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, priority: Priority) -> PrioritizedTask {
        PrioritizedTask::new(text, priority, "Work")
    }

    #[test]
    fn test_groups_in_fixed_order_and_skips_empty() {
        let input = vec![
            task("task1", Priority::Low),
            task("task2", Priority::High),
            task("task3", Priority::High),
        ];

        let groups = group_tasks_by_priority(&input);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].priority, Priority::High);
        assert_eq!(groups[0].tasks, vec![input[1].clone(), input[2].clone()]);
        assert_eq!(groups[1].priority, Priority::Low);
        assert_eq!(groups[1].tasks, vec![input[0].clone()]);
    }

    #[test]
    fn test_preserves_relative_order_within_group() {
        let input = vec![
            task("c", Priority::Medium),
            task("a", Priority::Low),
            task("b", Priority::Medium),
            task("d", Priority::Medium),
        ];

        let groups = group_tasks_by_priority(&input);
        let medium: Vec<&str> = groups[0].tasks.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(groups[0].priority, Priority::Medium);
        assert_eq!(medium, vec!["c", "b", "d"]);
    }

    #[test]
    fn test_unknown_priority_from_wire_lands_in_medium() {
        let input: Vec<PrioritizedTask> =
            serde_json::from_str(r#"[{"task":"x","priority":"Someday","category":"Home"}]"#).unwrap();
        let groups = group_tasks_by_priority(&input);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].priority, Priority::Medium);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_tasks_by_priority(&[]).is_empty());
    }
}
