//! Graph-instanties en de gedeelde runtime-context.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::node::{InstanceId, NodeId};
use super::value::Value;
use crate::blend_space::{BlendSpaceManager, BlendSpaceUniqueData};
use crate::motion::{MotionInstancePool, MotionSet};
use crate::pose::{PosePool, Skeleton};

/// Toestand per node, per instantie.
pub type UniqueDataMap<T> = HashMap<NodeId, T>;

/// Eén karakter dat een graph afspeelt. Bezit alle toestand die per
/// instantie verschilt; die wordt samen met de instantie opgeruimd.
#[derive(Debug)]
pub struct AnimGraphInstance {
    id: InstanceId,
    skeleton: Arc<Skeleton>,
    motion_set: Arc<dyn MotionSet>,
    motion_set_revision: u64,
    parameters: BTreeMap<String, Value>,
    unique_data: UniqueDataMap<BlendSpaceUniqueData>,
}

impl AnimGraphInstance {
    #[must_use]
    pub fn new(id: InstanceId, skeleton: Arc<Skeleton>, motion_set: Arc<dyn MotionSet>) -> Self {
        Self {
            id,
            skeleton,
            motion_set,
            motion_set_revision: 0,
            parameters: BTreeMap::new(),
            unique_data: UniqueDataMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub fn motion_set(&self) -> &dyn MotionSet {
        self.motion_set.as_ref()
    }

    /// Teller die ophoogt bij elke wissel van motion set.
    #[must_use]
    pub fn motion_set_revision(&self) -> u64 {
        self.motion_set_revision
    }

    /// Vervangt de motion set. Nodes lossen hun motions bij de volgende
    /// update opnieuw op.
    pub fn set_motion_set(&mut self, motion_set: Arc<dyn MotionSet>) {
        self.motion_set = motion_set;
        self.motion_set_revision += 1;
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn clear_parameter(&mut self, name: &str) {
        self.parameters.remove(name);
    }

    #[must_use]
    pub fn unique_data(&self, node: NodeId) -> Option<&BlendSpaceUniqueData> {
        self.unique_data.get(&node)
    }

    /// Haalt de unique data tijdelijk uit de instantie zodat de node er
    /// naast de rest van de instantie mee kan werken.
    pub(crate) fn take_unique_data(&mut self, node: NodeId) -> BlendSpaceUniqueData {
        self.unique_data.remove(&node).unwrap_or_default()
    }

    pub(crate) fn put_unique_data(&mut self, node: NodeId, data: BlendSpaceUniqueData) {
        self.unique_data.insert(node, data);
    }

    pub fn remove_unique_data(&mut self, node: NodeId) -> Option<BlendSpaceUniqueData> {
        self.unique_data.remove(&node)
    }

    #[must_use]
    pub fn unique_data_count(&self) -> usize {
        self.unique_data.len()
    }
}

/// Gedeelde diensten voor alle instanties: blend-space manager en pools.
#[derive(Debug)]
pub struct AnimGraphContext {
    manager: BlendSpaceManager,
    motion_pool: Arc<MotionInstancePool>,
    pose_pool: PosePool,
    next_instance: AtomicU64,
}

impl Default for AnimGraphContext {
    fn default() -> Self {
        Self::new(BlendSpaceManager::default())
    }
}

impl AnimGraphContext {
    #[must_use]
    pub fn new(manager: BlendSpaceManager) -> Self {
        Self {
            manager,
            motion_pool: MotionInstancePool::new(),
            pose_pool: PosePool::new(),
            next_instance: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn manager(&self) -> &BlendSpaceManager {
        &self.manager
    }

    #[must_use]
    pub fn motion_pool(&self) -> &Arc<MotionInstancePool> {
        &self.motion_pool
    }

    #[must_use]
    pub fn pose_pool(&self) -> &PosePool {
        &self.pose_pool
    }

    /// Maakt een instantie aan met een nieuw, uniek id.
    #[must_use]
    pub fn create_instance(
        &self,
        skeleton: Arc<Skeleton>,
        motion_set: Arc<dyn MotionSet>,
    ) -> AnimGraphInstance {
        let id = InstanceId::new(self.next_instance.fetch_add(1, Ordering::Relaxed));
        AnimGraphInstance::new(id, skeleton, motion_set)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::AnimGraphContext;
    use crate::graph::value::Value;
    use crate::motion::InMemoryMotionSet;
    use crate::pose::Skeleton;

    #[test]
    fn instances_get_unique_ids() {
        let ctx = AnimGraphContext::default();
        let skeleton = Arc::new(Skeleton::chain(1));
        let motions = Arc::new(InMemoryMotionSet::new());
        let a = ctx.create_instance(skeleton.clone(), motions.clone());
        let b = ctx.create_instance(skeleton, motions);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn motion_set_swap_bumps_revision() {
        let ctx = AnimGraphContext::default();
        let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), Arc::new(InMemoryMotionSet::new()));
        instance.set_parameter("speed", 2.0);
        assert_eq!(instance.parameter("speed"), Some(&Value::Number(2.0)));

        instance.set_motion_set(Arc::new(InMemoryMotionSet::new()));
        assert_eq!(instance.motion_set_revision(), 1);
    }
}
