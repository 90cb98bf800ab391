//! ECS task-definition catalog.
//!
//! Scheduled jobs are deployed as ECS task definitions named
//! `cron-roamhq-{client}-{taskname}`. This module pulls that convention out
//! of raw identifiers (usually full ARNs such as
//! `arn:aws:ecs:ap-southeast-2:123:task-definition/cron-roamhq-beg-daily-sync:3`)
//! and groups the results into a per-client catalog for the console.
//!
//! Nothing here fails: identifiers that do not follow the convention are
//! skipped.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

/// Name prefix shared by every console-operable task definition.
pub const TASK_PREFIX: &str = "cron-roamhq-";

const DEFINITION_MARKER: &str = "task-definition/";

/// Branded display names for clients whose key does not capitalise cleanly.
const CLIENT_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("beg", "BEG"),
    ("mrt", "MRT"),
    ("mudgee1", "Mudgee"),
    ("phillipisland", "Phillip Island"),
    ("portmacquarie", "Port Macquarie"),
    ("swanvalley", "Swan Valley"),
    ("tourismbowen", "Tourism Bowen"),
    ("geelongbellarine", "Geelong Bellarine"),
    ("goldenoutback", "Golden Outback"),
    ("lovewestside", "Love Westside"),
    ("northofthemurray", "North of the Murray"),
    ("bourkeshire", "Bourke Shire"),
    ("coralcoast", "Coral Coast"),
    ("yarraranges", "Yarra Ranges"),
    ("whitsundays", "Whitsundays"),
    ("vicheartland", "Vic Heartland"),
    ("grampians", "Grampians"),
    ("melbournenow", "Melbourne Now"),
];

/// One task definition that follows the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTask {
    /// Tenant key, e.g. `beg`.
    pub client: String,
    /// Kebab-case task name, e.g. `daily-sync`.
    pub task_name: String,
    /// `cron-roamhq-{client}-{task_name}`, without ARN prefix or revision.
    pub full_identifier: String,
}

/// A task as shown in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEntry {
    #[serde(rename = "name")]
    pub display_task_name: String,
    /// Passed back verbatim as the `taskDefinition` of a run request.
    #[serde(rename = "taskDefinition")]
    pub full_identifier: String,
}

/// All tasks belonging to one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientGroup {
    #[serde(rename = "client")]
    pub client_key: String,
    pub display_name: String,
    /// In the order the identifiers were first seen.
    pub tasks: Vec<TaskEntry>,
}

/// Parse one raw identifier.
///
/// Returns `None` if there is no `task-definition/cron-roamhq-…` segment, or
/// if the name lacks a client or task part.
#[must_use]
pub fn parse_task_definition(raw: &str) -> Option<ParsedTask> {
    let marker_at = raw.find(&format!("{DEFINITION_MARKER}{TASK_PREFIX}"))?;
    let tail = &raw[marker_at.saturating_add(DEFINITION_MARKER.len())..];
    let name = tail.split_once(':').map_or(tail, |(name, _revision)| name);

    let segments: Vec<&str> = name.split('-').collect();
    let ["cron", "roamhq", client, rest @ ..] = segments.as_slice() else {
        return None;
    };
    if rest.is_empty() {
        return None;
    }

    Some(ParsedTask {
        client: (*client).to_owned(),
        task_name: rest.join("-"),
        full_identifier: name.to_owned(),
    })
}

/// `daily-sync` → `Daily Sync`.
///
/// Only the first character of each word changes case.
#[must_use]
pub fn format_task_name(task_name: &str) -> String {
    task_name
        .split('-')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display name for a client key: the branded override if there is one,
/// otherwise the key with its first character uppercased.
#[must_use]
pub fn format_client_name(client: &str) -> String {
    CLIENT_DISPLAY_NAMES
        .iter()
        .find(|(key, _)| *key == client)
        .map_or_else(|| capitalize_first(client), |(_, name)| (*name).to_owned())
}

/// Build the per-client catalog from raw identifiers.
///
/// Groups are sorted by display name; tasks keep their input order.
pub fn group_tasks_by_client<I, S>(identifiers: I) -> Vec<ClientGroup>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: Vec<ClientGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for raw in identifiers {
        let Some(parsed) = parse_task_definition(raw.as_ref()) else {
            continue;
        };

        let entry = TaskEntry {
            display_task_name: format_task_name(&parsed.task_name),
            full_identifier: parsed.full_identifier,
        };

        if let Some(&at) = index.get(&parsed.client) {
            if let Some(group) = groups.get_mut(at) {
                group.tasks.push(entry);
            }
        } else {
            index.insert(parsed.client.clone(), groups.len());
            groups.push(ClientGroup {
                display_name: format_client_name(&parsed.client),
                client_key: parsed.client,
                tasks: vec![entry],
            });
        }
    }

    // Stable: equal display names keep encounter order.
    groups.sort_by(|a, b| collate(&a.display_name, &b.display_name));
    groups
}

/// Locale-style ordering: case-insensitive first, then lowercase before
/// uppercase, as a browser's `localeCompare` would order display names.
fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:ecs:ap-southeast-2:123456789012:task-definition/";

    fn arn(name: &str, revision: u32) -> String {
        format!("{ARN}{name}:{revision}")
    }

    #[test]
    fn parses_full_arn() {
        let parsed = parse_task_definition(&arn("cron-roamhq-beg-daily-sync", 3)).unwrap();
        assert_eq!(
            parsed,
            ParsedTask {
                client: "beg".to_owned(),
                task_name: "daily-sync".to_owned(),
                full_identifier: "cron-roamhq-beg-daily-sync".to_owned(),
            }
        );
    }

    #[test]
    fn parses_without_revision() {
        let parsed = parse_task_definition("task-definition/cron-roamhq-mrt-report").unwrap();
        assert_eq!(parsed.client, "mrt");
        assert_eq!(parsed.task_name, "report");
        assert_eq!(parsed.full_identifier, "cron-roamhq-mrt-report");
    }

    #[test]
    fn rejects_other_prefixes() {
        assert_eq!(parse_task_definition(&arn("other-prefix-x", 1)), None);
        assert_eq!(parse_task_definition(&arn("cron-other-beg-sync", 1)), None);
        assert_eq!(parse_task_definition("cron-roamhq-beg-sync"), None);
    }

    #[test]
    fn rejects_missing_task_name() {
        assert_eq!(parse_task_definition(&arn("cron-roamhq-beg", 1)), None);
        assert_eq!(parse_task_definition(&arn("cron-roamhq-", 1)), None);
        assert_eq!(parse_task_definition("task-definition/cron-roamhq-"), None);
    }

    #[test]
    fn task_name_keeps_inner_hyphens() {
        let parsed =
            parse_task_definition(&arn("cron-roamhq-swanvalley-import-atdw-products", 12))
                .unwrap();
        assert_eq!(parsed.client, "swanvalley");
        assert_eq!(parsed.task_name, "import-atdw-products");
    }

    #[test]
    fn uses_first_matching_segment() {
        let raw = "task-definition/cron-roamhq-beg-a:1 task-definition/cron-roamhq-mrt-b:2";
        let parsed = parse_task_definition(raw).unwrap();
        assert_eq!(parsed.full_identifier, "cron-roamhq-beg-a");
    }

    #[test]
    fn formats_task_names() {
        assert_eq!(format_task_name("daily-sync"), "Daily Sync");
        assert_eq!(format_task_name("sync"), "Sync");
        assert_eq!(format_task_name("reindex-ATDW-feed"), "Reindex ATDW Feed");
        assert_eq!(format_task_name("mixedCase-job"), "MixedCase Job");
        assert_eq!(format_task_name("double--hyphen"), "Double  Hyphen");
    }

    #[test]
    fn formats_client_names() {
        assert_eq!(format_client_name("beg"), "BEG");
        assert_eq!(format_client_name("northofthemurray"), "North of the Murray");
        assert_eq!(format_client_name("mudgee1"), "Mudgee");
        assert_eq!(format_client_name("unknownclient"), "Unknownclient");
        assert_eq!(format_client_name("BEG"), "BEG");
        assert_eq!(format_client_name(""), "");
    }

    #[test]
    fn client_override_is_case_sensitive() {
        assert_eq!(format_client_name("Phillipisland"), "Phillipisland");
    }

    #[test]
    fn groups_and_sorts_clients() {
        let groups = group_tasks_by_client([
            arn("cron-roamhq-beg-sync", 1),
            arn("cron-roamhq-mrt-report", 2),
            arn("cron-roamhq-beg-cleanup", 3),
        ]);

        assert_eq!(
            groups,
            vec![
                ClientGroup {
                    client_key: "beg".to_owned(),
                    display_name: "BEG".to_owned(),
                    tasks: vec![
                        TaskEntry {
                            display_task_name: "Sync".to_owned(),
                            full_identifier: "cron-roamhq-beg-sync".to_owned(),
                        },
                        TaskEntry {
                            display_task_name: "Cleanup".to_owned(),
                            full_identifier: "cron-roamhq-beg-cleanup".to_owned(),
                        },
                    ],
                },
                ClientGroup {
                    client_key: "mrt".to_owned(),
                    display_name: "MRT".to_owned(),
                    tasks: vec![TaskEntry {
                        display_task_name: "Report".to_owned(),
                        full_identifier: "cron-roamhq-mrt-report".to_owned(),
                    }],
                },
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_catalog() {
        assert!(group_tasks_by_client(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn non_matching_identifiers_are_skipped() {
        let groups = group_tasks_by_client([
            arn("nginx-proxy", 4),
            arn("cron-roamhq-grampians-nightly", 1),
            "garbage".to_owned(),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].display_name, "Grampians");
    }

    #[test]
    fn sort_ignores_case_like_locale_compare() {
        let groups = group_tasks_by_client([
            arn("cron-roamhq-mrt-a", 1),
            arn("cron-roamhq-melbournenow-b", 1),
            arn("cron-roamhq-coralcoast-c", 1),
            arn("cron-roamhq-beg-d", 1),
            arn("cron-roamhq-bourkeshire-e", 1),
        ]);
        let names: Vec<&str> = groups.iter().map(|g| g.display_name.as_str()).collect();
        assert_eq!(
            names,
            ["BEG", "Bourke Shire", "Coral Coast", "Melbourne Now", "MRT"]
        );
    }

    #[test]
    fn space_sorts_before_letters() {
        let groups = group_tasks_by_client([
            arn("cron-roamhq-portmacquariex-a", 1),
            arn("cron-roamhq-portmacquarie-b", 1),
        ]);
        let names: Vec<&str> = groups.iter().map(|g| g.display_name.as_str()).collect();
        assert_eq!(names, ["Port Macquarie", "Portmacquariex"]);
    }

    #[test]
    fn repeated_identifiers_are_kept() {
        let groups = group_tasks_by_client([
            arn("cron-roamhq-beg-sync", 1),
            arn("cron-roamhq-beg-sync", 2),
        ]);
        assert_eq!(groups[0].tasks.len(), 2);
    }

    #[test]
    fn serializes_with_console_field_names() {
        let groups = group_tasks_by_client([arn("cron-roamhq-yarraranges-weekly-digest", 5)]);
        let json = serde_json::to_value(&groups).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "client": "yarraranges",
                "displayName": "Yarra Ranges",
                "tasks": [{
                    "name": "Weekly Digest",
                    "taskDefinition": "cron-roamhq-yarraranges-weekly-digest"
                }]
            }])
        );
    }
}
