//! Terminal rendering of worker replies

use colored::Colorize;
use serde_json::Value;

use crate::client::Reply;

/// Print a reply for humans
pub fn print_reply(reply: &Reply) {
    if !reply.is_envelope() {
        print_transport_error(reply);
        return;
    }

    let body = &reply.body;
    let request_id = body["request_id"].as_str().unwrap_or("-");
    let agent = body["agent_name"].as_str().unwrap_or("-");

    if reply.is_success() {
        let output = &body["output"];
        println!("{} {}", "✔".green().bold(), output["result"].as_str().unwrap_or("").bold());
        println!("  {} {}", "agent:".dimmed(), agent);
        println!("  {} {}", "request:".dimmed(), request_id);
        if let Some(confidence) = output["confidence"].as_f64() {
            println!("  {} {:.2}", "confidence:".dimmed(), confidence);
        }
        for line in detail_lines(&output["details"]) {
            println!("  {}", line);
        }
    } else {
        let error = &body["error"];
        println!(
            "{} {} {}",
            "✘".red().bold(),
            error["type"].as_str().unwrap_or("UNKNOWN").red().bold(),
            error["message"].as_str().unwrap_or("")
        );
        println!("  {} {}", "agent:".dimmed(), agent);
        println!("  {} {}", "request:".dimmed(), request_id);
    }
}

fn print_transport_error(reply: &Reply) {
    let error = reply.body["error"].as_str().unwrap_or("unexpected response");
    println!("{} HTTP {} {}", "✘".red().bold(), reply.status, error.red());
    if let Some(details) = reply.body["details"].as_str() {
        println!("  {} {}", "details:".dimmed(), details);
    }
}

/// `key: value` lines for the interesting detail fields
fn detail_lines(details: &Value) -> Vec<String> {
    let Some(map) = details.as_object() else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for (key, value) in map {
        if key == "agent_name" {
            continue;
        }
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Null => "none".to_string(),
            other => other.to_string(),
        };
        lines.push(format!("{} {}", format!("{}:", key).dimmed(), rendered));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_lines_skip_agent_name() {
        colored::control::set_override(false);
        let lines = detail_lines(&json!({
            "agent_name": "KnowledgeBaseBuilderAgent",
            "update_mode": "append",
            "wiki_size": 42,
            "task_deadline": null
        }));

        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"update_mode: append".to_string()));
        assert!(lines.contains(&"wiki_size: 42".to_string()));
        assert!(lines.contains(&"task_deadline: none".to_string()));
    }

    #[test]
    fn test_non_object_details_render_nothing() {
        assert!(detail_lines(&Value::Null).is_empty());
    }
}
