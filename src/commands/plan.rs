// ABOUTME: Plan command implementation.
// ABOUTME: Validates the descriptor and prints start batches without executing.

use flotilla::config::Descriptor;
use flotilla::error::Result;
use flotilla::graph::DependencyGraph;
use flotilla::output::Output;

/// Validate and print the computed start order, one line per batch.
pub fn plan(descriptor: Descriptor, output: Output) -> Result<()> {
    let graph = DependencyGraph::build(&descriptor)?;
    let schedule = graph.schedule();

    output.progress(&format!(
        "Project {}: {} service(s) in {} batch(es)",
        descriptor.project,
        graph.len(),
        schedule.len()
    ));

    for (index, batch) in schedule.batches().iter().enumerate() {
        let members: Vec<String> = batch
            .iter()
            .map(|name| {
                let one_shot = descriptor.spec(name).is_some_and(|s| s.one_shot);
                if one_shot {
                    format!("{} (one-shot)", name)
                } else {
                    name.to_string()
                }
            })
            .collect();
        println!("batch {}: {}", index + 1, members.join(", "));
    }

    Ok(())
}
