use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::domain::ProblemSpec;
use crate::error::RunError;

/// A dataset record before full validation. Only the resume key and the
/// category are extracted up front; the rest is validated per problem so a
/// single malformed record cannot take down the whole run.
#[derive(Clone, Debug)]
pub struct RawProblem {
    pub title: String,
    pub category: Option<String>,
    payload: Value,
}

impl RawProblem {
    pub fn from_value(payload: Value) -> Option<Self> {
        let title = payload.get("title")?.as_str()?.to_string();
        let category = payload
            .get("category")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self {
            title,
            category,
            payload,
        })
    }

    pub fn category_or_default(&self) -> String {
        self.category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string())
    }

    /// Full validation against the problem schema. Failure here is
    /// problem-local: the caller records it and moves on.
    pub fn validate(&self) -> Result<ProblemSpec, String> {
        serde_json::from_value(self.payload.clone()).map_err(|e| e.to_string())
    }
}

/// Loads problems from a JSON Lines file (one JSON object per line) or from a
/// single top-level JSON array. A record without a string `title` is fatal:
/// without the resume key nothing downstream can be recorded or skipped.
pub fn load_problems(path: &Path) -> Result<Vec<RawProblem>, RunError> {
    let dataset_err = |message: String| RunError::Dataset {
        path: path.to_path_buf(),
        message,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| dataset_err(e.to_string()))?;

    let values: Vec<Value> = if raw.trim_start().starts_with('[') {
        serde_json::from_str(&raw).map_err(|e| dataset_err(e.to_string()))?
    } else {
        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| dataset_err(format!("line {}: {}", i + 1, e)))
            })
            .collect::<Result<_, _>>()?
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            RawProblem::from_value(value)
                .ok_or_else(|| dataset_err(format!("record {}: missing string `title`", i + 1)))
        })
        .collect()
}

/// Order-preserving category filter; identity when no allow-set is configured.
pub fn filter_by_category(problems: Vec<RawProblem>, allow: Option<&[String]>) -> Vec<RawProblem> {
    match allow {
        None => problems,
        Some(allowed) => problems
            .into_iter()
            .filter(|p| {
                p.category
                    .as_deref()
                    .is_some_and(|c| allowed.iter().any(|a| a == c))
            })
            .collect(),
    }
}

/// Resume filter: drops titles already present in the run log, preserving
/// order. Keyed purely on title identity.
pub fn skip_processed(problems: Vec<RawProblem>, processed: &HashSet<String>) -> Vec<RawProblem> {
    problems
        .into_iter()
        .filter(|p| !processed.contains(&p.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(title: &str, category: Option<&str>) -> RawProblem {
        let mut payload = json!({ "title": title });
        if let Some(c) = category {
            payload["category"] = json!(c);
        }
        RawProblem::from_value(payload).unwrap()
    }

    #[test]
    fn category_filter_is_order_preserving() {
        let problems = vec![
            raw("A", Some("Sorting")),
            raw("B", Some("Graphs")),
            raw("C", Some("Sorting")),
            raw("D", None),
        ];

        let allow = vec!["Sorting".to_string()];
        let filtered = filter_by_category(problems, Some(&allow));
        let titles: Vec<_> = filtered.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn no_category_filter_is_identity() {
        let problems = vec![raw("A", Some("Sorting")), raw("B", None)];
        let filtered = filter_by_category(problems, None);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn skip_processed_drops_only_known_titles() {
        let problems = vec![raw("A", None), raw("B", None), raw("C", None)];
        let processed: HashSet<String> = ["B".to_string()].into_iter().collect();

        let remaining = skip_processed(problems, &processed);
        let titles: Vec<_> = remaining.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn validation_rejects_missing_time_limit() {
        let problem = RawProblem::from_value(json!({
            "title": "Broken",
            "memory_limit": 256,
            "test_cases": []
        }))
        .unwrap();

        let err = problem.validate().unwrap_err();
        assert!(err.contains("time_limit"), "unexpected message: {err}");
    }

    #[test]
    fn validation_accepts_complete_records() {
        let problem = RawProblem::from_value(json!({
            "title": "Two Sum",
            "category": "Introductory",
            "time_limit": 1.0,
            "memory_limit": 256,
            "test_cases": [{ "input": "1 2\n", "output": "3\n" }]
        }))
        .unwrap();

        let spec = problem.validate().unwrap();
        assert_eq!(spec.title, "Two Sum");
        assert_eq!(spec.test_cases.len(), 1);
    }

    #[test]
    fn jsonl_and_array_forms_both_load() {
        let dir = std::env::temp_dir();
        let jsonl = dir.join(format!("codebench_ds_{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(&jsonl, "{\"title\": \"A\"}\n\n{\"title\": \"B\"}\n").unwrap();
        let problems = load_problems(&jsonl).unwrap();
        std::fs::remove_file(&jsonl).unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].title, "A");

        let array = dir.join(format!("codebench_ds_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&array, r#"[{"title": "C"}, {"title": "D"}]"#).unwrap();
        let problems = load_problems(&array).unwrap();
        std::fs::remove_file(&array).unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[1].title, "D");
    }

    #[test]
    fn record_without_title_is_fatal() {
        let path = std::env::temp_dir().join(format!("codebench_ds_{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{\"category\": \"Sorting\"}\n").unwrap();
        let err = load_problems(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, RunError::Dataset { .. }));
    }
}
