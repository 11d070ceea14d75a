//! Display-task expansion

use crate::pairs::{TVPair, TVPairSet, TaskVariantPairs};
use ciplan_core::project::Project;

/// Close `pairs` over the display tasks of the selected variants.
///
/// Requesting an execution task pulls in the display task that aggregates
/// it. Requesting a display task, directly or through one of its members,
/// pulls in every member as an execution pair. Nested display tasks are not
/// followed.
pub fn expand_display_tasks(
    project: &Project,
    pairs: TVPairSet,
    tasks: &[String],
    variants: &[String],
) -> TaskVariantPairs {
    let mut exec_tasks = pairs;
    let mut display_tasks = TVPairSet::new();
    let mut requested: Vec<String> = tasks.to_vec();

    for bv in &project.build_variants {
        if !variants.contains(&bv.name) {
            continue;
        }

        let mut added = Vec::new();
        for task in &requested {
            if let Some(dt) = bv.display_task_name_for(task)
                && !requested.iter().any(|t| t == dt)
                && !added.contains(&dt)
            {
                added.push(dt);
            }
        }
        let added: Vec<String> = added.into_iter().map(ToString::to_string).collect();
        requested.extend(added);

        for dt in &bv.display_tasks {
            if requested.contains(&dt.name) {
                display_tasks.push(TVPair::new(bv.name.as_str(), dt.name.as_str()));
                for member in &dt.execution_tasks {
                    exec_tasks.push(TVPair::new(bv.name.as_str(), member.as_str()));
                }
            }
        }
    }

    TaskVariantPairs {
        exec_tasks,
        display_tasks,
    }
}
