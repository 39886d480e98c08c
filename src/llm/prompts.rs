//! Prompt templates for dataset generation

use super::PromptBuilder;
use crate::dataset::Unit;
use crate::extract::FunctionRecord;

/// The question asked about every function
pub fn question_for(function: &str) -> String {
    format!("What does the function {} do?", function)
}

/// Built-in templates for the two generation tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl PromptBuilder for DefaultPrompts {
    fn build(&self, unit: &Unit, digest: &str) -> String {
        match unit {
            Unit::Function(record) => qa_prompt(record, digest),
            Unit::Requirement(requirement) => design_prompt(requirement, digest),
        }
    }
}

fn qa_prompt(record: &FunctionRecord, digest: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(QA_SYSTEM_PROMPT);
    prompt.push_str("\n## Repository Summary\n\n");
    prompt.push_str(digest);
    prompt.push_str("\n\n");
    prompt.push_str(QA_INSTRUCTIONS);
    prompt.push_str(QA_EXAMPLE);

    prompt.push_str("## Function To Analyze\n\n");
    prompt.push_str(&format!("**File:** `{}`\n\n", record.file));
    prompt.push_str(&format!("```python\n{}\n```\n\n", record.code));

    prompt.push_str("Respond with a JSON object with these fields:\n");
    prompt.push_str(&format!(
        "{{\n  \"function_name\": \"{}\",\n  \"question\": \"{}\",\n  \"answer\": \"...\",\n  \"trace\": \"...\"\n}}\n",
        record.function,
        question_for(&record.function)
    ));

    prompt
}

fn design_prompt(requirement: &str, digest: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(DESIGN_SYSTEM_PROMPT);
    prompt.push_str(DESIGN_INSTRUCTIONS);
    prompt.push_str(DESIGN_EXAMPLE);

    prompt.push_str("## Repository Summary\n\n");
    prompt.push_str(digest);
    prompt.push_str("\n\n");

    prompt.push_str("## Requirement\n\n");
    prompt.push_str(&format!("\"{}\"\n\n", requirement));

    prompt.push_str("Respond with a JSON object with these fields:\n");
    prompt.push_str("{\n  \"requirement\": \"...\",\n  \"design\": \"...\",\n  \"trace\": \"...\"\n}\n");

    prompt
}

const QA_SYSTEM_PROMPT: &str = r#"You are a senior Python architect who is good at understanding business logic and code structure.
"#;

const QA_INSTRUCTIONS: &str = r#"## Instructions

Analyze the function below and return a JSON analysis with:
1. `function_name`: the function name
2. `question`: a question of the form "What does the function XXX do?"
3. `answer`: a short, clear statement of what the function is for, focusing on intent rather than code details
4. `trace`: how you understood the function step by step (parameters, call flow, key statements, context). Use natural language; do not repeat or output code.

"#;

const QA_EXAMPLE: &str = r#"## Example

Function code:
```python
def add(a, b):
    return a + b
```

Expected output:
{
  "function_name": "add",
  "question": "What does the function add do?",
  "answer": "Adds the two inputs a and b and returns the result.",
  "trace": "The signature takes two parameters a and b. The body is a single return of a + b, so the function performs addition."
}

"#;

const DESIGN_SYSTEM_PROMPT: &str = r#"You are an experienced software architect who designs web systems from business requirements. The project you are working on is a backend service whose structure is summarized below.
"#;

const DESIGN_INSTRUCTIONS: &str = r#"
## Instructions

For the natural-language requirement, propose a reasonable design based on the existing architecture. Return:
1. `requirement`: the original requirement
2. `design`: a short, clear description of how you would implement it with the project's existing components
3. `trace`: the reasoning that led to the design (no code): which modules are involved, how calls flow, dependencies and constraints

"#;

const DESIGN_EXAMPLE: &str = r#"## Example

Requirement:
Add an endpoint that accepts an integer and returns its square.

Expected output:
{
  "requirement": "Add an endpoint that accepts an integer and returns its square.",
  "design": "Add a POST endpoint such as `/square` that reads an integer from the JSON body, squares it and returns the result as JSON.",
  "trace": "This is simple numeric business logic that fits a POST handler. The project already routes requests through blueprints, so the endpoint can be registered the same way, validate the body, compute the value and reuse the existing response helpers."
}

"#;
