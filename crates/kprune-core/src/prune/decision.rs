use crate::cluster::LiveResource;
use crate::manifest::ExpectedSet;

use super::types::Decision;

/// Retain a resource whose identity is expected, delete everything else.
pub fn classify(resource: &LiveResource, expected: &ExpectedSet) -> Decision {
    if expected.contains(&resource.hash()) {
        Decision::Retain
    } else {
        Decision::Delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResourceKind;
    use crate::cluster::ObjectHash;

    fn deployment(name: &str) -> LiveResource {
        LiveResource::new(ResourceKind::new("apps", "v1", "Deployment"), Some("ns"), name)
    }

    #[test]
    fn expected_resource_is_retained() {
        let expected: ExpectedSet = [ObjectHash::new("Deployment", "ns", "d1")]
            .into_iter()
            .collect();
        assert_eq!(classify(&deployment("d1"), &expected), Decision::Retain);
        assert_eq!(classify(&deployment("d2"), &expected), Decision::Delete);
    }

    #[test]
    fn empty_set_deletes_everything() {
        assert_eq!(
            classify(&deployment("d1"), &ExpectedSet::new()),
            Decision::Delete
        );
    }

    #[test]
    fn membership_is_exact() {
        // Same name in another namespace is a different object
        let expected: ExpectedSet = [ObjectHash::new("Deployment", "other", "d1")]
            .into_iter()
            .collect();
        assert_eq!(classify(&deployment("d1"), &expected), Decision::Delete);

        let prefix: ExpectedSet = [ObjectHash::new("Deployment", "ns", "d")]
            .into_iter()
            .collect();
        assert_eq!(classify(&deployment("d1"), &prefix), Decision::Delete);
    }
}
