use std::collections::HashMap;

use crate::models::observation::Observation;
use crate::reconcile::normalize::{employer_group_component, normalize_key, EmployerComponent};

/// Identity of a group. `role` is only ever `Some` when role splitting is on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub employer: EmployerComponent,
    pub role: Option<String>,
}

impl GroupKey {
    pub fn for_observation(observation: &Observation, position: usize, include_role: bool) -> Self {
        let employer = employer_group_component(observation.employer_name.as_deref(), position);
        let role = if include_role {
            normalize_key(observation.applied_position.as_deref())
        } else {
            None
        };
        Self { employer, role }
    }
}

/// All observations that share a key, in input order. Never empty.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub members: Vec<&'a Observation>,
}

/// Partitions observations by group key.
///
/// Groups come back in order of first appearance and members keep their input
/// order. Nothing is deduplicated here; the merge step decides.
pub fn group(observations: &[Observation], include_role_in_key: bool) -> Vec<Group<'_>> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();

    for (position, observation) in observations.iter().enumerate() {
        let key = GroupKey::for_observation(observation, position, include_role_in_key);
        match index.get(&key) {
            Some(&slot) => groups[slot].members.push(observation),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    members: vec![observation],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(employer: Option<&str>, role: Option<&str>) -> Observation {
        Observation {
            employer_name: employer.map(str::to_string),
            applied_position: role.map(str::to_string),
            ..Observation::default()
        }
    }

    #[test]
    fn test_empty_input_gives_no_groups() {
        assert!(group(&[], false).is_empty());
    }

    #[test]
    fn test_same_employer_different_spelling_groups_together() {
        let input = vec![
            obs(Some("ABC GmbH"), None),
            obs(Some("  abc   gmbh "), None),
            obs(Some("XYZ AG"), None),
        ];
        let groups = group(&input, false);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[1].members.len(), 1);
        assert_eq!(
            groups[0].key.employer,
            EmployerComponent::Named("abc gmbh".to_string())
        );
    }

    #[test]
    fn test_members_keep_input_order() {
        let input = vec![
            obs(Some("ABC"), Some("first")),
            obs(Some("XYZ"), None),
            obs(Some("ABC"), Some("second")),
        ];
        let groups = group(&input, false);
        let roles: Vec<_> = groups[0]
            .members
            .iter()
            .map(|o| o.applied_position.as_deref())
            .collect();
        assert_eq!(roles, vec![Some("first"), Some("second")]);
    }

    #[test]
    fn test_unnamed_observations_never_merge() {
        let input = vec![obs(None, None), obs(Some("  "), None), obs(Some("ABC"), None)];
        let groups = group(&input, false);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.members.len() == 1));
    }

    #[test]
    fn test_role_ignored_unless_configured() {
        let input = vec![
            obs(Some("ABC"), Some("Backend Developer")),
            obs(Some("ABC"), Some("Frontend Developer")),
        ];
        let groups = group(&input, false);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key.role, None);
    }

    #[test]
    fn test_role_splits_when_configured() {
        let input = vec![
            obs(Some("ABC"), Some("Backend Developer")),
            obs(Some("ABC"), Some("backend  developer")),
            obs(Some("ABC"), Some("Frontend Developer")),
            obs(Some("ABC"), None),
        ];
        let groups = group(&input, true);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].key.role.as_deref(), Some("backend developer"));
        assert_eq!(groups[2].key.role, None);
    }
}
