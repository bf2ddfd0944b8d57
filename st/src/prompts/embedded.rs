//! Embedded prompts

/// Task prioritization prompt; `task_list` is the numbered task lines
pub const PRIORITIZE: &str = r#"You are a task prioritization expert. Analyze the following list of tasks and return a JSON array of objects. Each object should have three keys: 'task' (the original task string), 'priority' (a string which can be 'High', 'Medium', or 'Low'), and 'category' (a simple one-word category like 'Work', 'Home', 'Personal', 'Health', 'Finance', 'Social').

Prioritize based on urgency and importance. Consider factors like:
- Deadlines and time sensitivity
- Impact on work or personal life
- Dependencies between tasks
- Health and safety concerns

Here are the tasks to analyze:
{{task_list}}

Return ONLY the JSON array, no additional text or formatting."#;

/// Look up an embedded template by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "prioritize" => Some(PRIORITIZE),
        _ => None,
    }
}
