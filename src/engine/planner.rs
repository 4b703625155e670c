use crate::models::{service_requirements::RequirementData, services::ServiceData};

use super::error::{EngineError, EngineResult};
use super::interval::Interval;
use super::store::StoreTxn;

/// Merged view of a service's demand for one resource type.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRequirement {
    pub resource_type: String,
    pub quantity: i64,
}

/// A provisional resource pick. Nothing is reserved until the booking
/// transaction re-validates and commits it.
#[derive(Clone, Debug)]
pub struct AllocationDraft {
    pub resource_id: u64,
}

pub fn resolve_service(txn: &mut dyn StoreTxn, service_id: u64) -> EngineResult<ServiceData> {
    match txn.service(service_id)? {
        Some(service) if service.is_active => Ok(service),
        _ => Err(EngineError::NotFound("service")),
    }
}

/// Requirement rows of the service, merged by resource type with
/// quantities summed and first-seen order kept. Two rows naming the same
/// type draw from one pool, so one unit can never satisfy both.
pub fn resolve_requirements(
    txn: &mut dyn StoreTxn,
    service_id: u64,
) -> EngineResult<Vec<ResourceRequirement>> {
    let rows = txn.requirements(service_id)?;
    Ok(merge_requirements(&rows))
}

fn merge_requirements(rows: &[RequirementData]) -> Vec<ResourceRequirement> {
    let mut merged: Vec<ResourceRequirement> = Vec::new();
    for row in rows {
        match merged
            .iter_mut()
            .find(|req| req.resource_type == row.resource_type)
        {
            Some(req) => req.quantity += i64::from(row.quantity),
            None => merged.push(ResourceRequirement {
                resource_type: row.resource_type.clone(),
                quantity: i64::from(row.quantity),
            }),
        }
    }
    merged
}

/// Draws non-overlapping resources from the availability index, one
/// requirement at a time. Fails fast with `InsufficientResources` naming
/// the first under-supplied type; no partial plan escapes. Read-only:
/// selected resources are not reserved and must be re-validated at commit
/// time.
pub fn plan(
    txn: &mut dyn StoreTxn,
    requirements: &[ResourceRequirement],
    interval: Interval,
) -> EngineResult<Vec<AllocationDraft>> {
    let mut drafts = Vec::new();
    for req in requirements {
        let candidates = txn.find_available(&req.resource_type, interval, req.quantity)?;
        if (candidates.len() as i64) < req.quantity {
            return Err(EngineError::InsufficientResources {
                resource_type: req.resource_type.clone(),
            });
        }
        drafts.extend(candidates.into_iter().map(|resource| AllocationDraft {
            resource_id: resource.id,
        }));
    }
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::Store;
    use crate::engine::testutil::{at, MemStore};
    use crate::models::resources::{
        RESOURCE_STATUS_UNAVAILABLE, RESOURCE_TYPE_EQUIPMENT, RESOURCE_TYPE_PERSONNEL,
    };

    fn row(id: u64, resource_type: &str, quantity: i32) -> RequirementData {
        RequirementData {
            id,
            service_id: 1,
            resource_type: resource_type.to_string(),
            quantity,
        }
    }

    #[test]
    fn duplicate_type_rows_are_merged() {
        let rows = vec![
            row(1, RESOURCE_TYPE_EQUIPMENT, 2),
            row(2, RESOURCE_TYPE_PERSONNEL, 1),
            row(3, RESOURCE_TYPE_EQUIPMENT, 1),
        ];
        let merged = merge_requirements(&rows);
        assert_eq!(
            merged,
            vec![
                ResourceRequirement {
                    resource_type: RESOURCE_TYPE_EQUIPMENT.to_string(),
                    quantity: 3,
                },
                ResourceRequirement {
                    resource_type: RESOURCE_TYPE_PERSONNEL.to_string(),
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn empty_requirements_plan_to_nothing() {
        let store = MemStore::new();
        let interval = Interval::new(at(9, 0), at(10, 0)).unwrap();
        let drafts = store
            .transaction(|txn| plan(txn, &[], interval))
            .unwrap();
        assert!(drafts.is_empty());
    }

    #[test]
    fn plan_fails_fast_when_a_pool_is_short() {
        let store = MemStore::new();
        store.add_personnel("p1");
        let interval = Interval::new(at(9, 0), at(10, 0)).unwrap();

        let requirements = vec![
            ResourceRequirement {
                resource_type: RESOURCE_TYPE_PERSONNEL.to_string(),
                quantity: 1,
            },
            ResourceRequirement {
                resource_type: RESOURCE_TYPE_EQUIPMENT.to_string(),
                quantity: 1,
            },
        ];
        let err = store
            .transaction(|txn| plan(txn, &requirements, interval))
            .unwrap_err();
        match err {
            EngineError::InsufficientResources { resource_type } => {
                assert_eq!(resource_type, RESOURCE_TYPE_EQUIPMENT);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn inactive_or_unavailable_resources_are_not_drawn() {
        let store = MemStore::new();
        let busy = store.add_personnel("p1");
        store.set_resource_status(busy, RESOURCE_STATUS_UNAVAILABLE);
        let interval = Interval::new(at(9, 0), at(10, 0)).unwrap();

        let requirements = vec![ResourceRequirement {
            resource_type: RESOURCE_TYPE_PERSONNEL.to_string(),
            quantity: 1,
        }];
        let err = store
            .transaction(|txn| plan(txn, &requirements, interval))
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientResources { .. }));
    }

    #[test]
    fn candidates_come_back_in_id_order() {
        let store = MemStore::new();
        let first = store.add_personnel("p1");
        let second = store.add_personnel("p2");
        let interval = Interval::new(at(9, 0), at(10, 0)).unwrap();

        let requirements = vec![ResourceRequirement {
            resource_type: RESOURCE_TYPE_PERSONNEL.to_string(),
            quantity: 2,
        }];
        let drafts = store
            .transaction(|txn| plan(txn, &requirements, interval))
            .unwrap();
        let picked: Vec<u64> = drafts.iter().map(|d| d.resource_id).collect();
        assert_eq!(picked, vec![first, second]);
    }
}
