//! Report rendering
//!
//! Turns a [`UsageIndex`] into the human-readable nested report:
//! Region -> User/Role -> Service -> Action, one indentation level per
//! depth. Rendering is deterministic: the index's ordered maps fix the
//! output order regardless of how the pipeline's tasks completed.

use colored::Colorize;

use crate::models::UsageIndex;

/// Render the nested usage report as plain text.
pub fn render(index: &UsageIndex) -> String {
    let mut output = String::new();

    for region_usage in index.regions.values() {
        output.push_str(&format!("Region: {}\n", region_usage.region));
        for usage in region_usage.usages.values() {
            output.push_str(&format!(
                "\t{}: {}\n",
                usage.subject.kind_label(),
                usage.subject.name()
            ));
            for (service_name, service) in &usage.services {
                output.push_str(&format!("\t\tService: {service_name}\n"));
                for action_name in service.actions.keys() {
                    output.push_str(&format!("\t\t\tAction: {action_name}\n"));
                }
            }
        }
    }

    output
}

/// Print the report to stdout with a summary header.
pub fn print_report(index: &UsageIndex, bucket: &str, date: &str) {
    println!(
        "{} {} ({})",
        "Daily usage report:".bold(),
        bucket.cyan(),
        date
    );

    if index.is_empty() {
        println!("{}", "No identity activity recorded.".dimmed());
        return;
    }

    print!("{}", render(index));
}
