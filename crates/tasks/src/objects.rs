use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use control::SimRig;
use futures::future::try_join_all;
use shared::{
    domain::Pose,
    error::{CoreError, CoreResult},
};
use tracing::debug;

pub trait SimObject: Send {
    fn name(&self) -> &str;
    fn pose(&self) -> Option<Pose>;
    fn set_pose(&mut self, pose: Pose);
}

#[async_trait]
pub trait AssetLoader: Send + Sync {
    async fn load_object(&self, name: &str) -> anyhow::Result<Box<dyn SimObject>>;
}

#[derive(Default)]
pub struct ObjectSet {
    objects: BTreeMap<String, Box<dyn SimObject>>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: Box<dyn SimObject>) {
        self.objects.insert(object.name().to_string(), object);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn pose(&self, name: &str) -> Option<Pose> {
        self.objects.get(name).and_then(|object| object.pose())
    }

    pub fn set_pose(&mut self, name: &str, pose: Pose) -> CoreResult<()> {
        let object = self
            .objects
            .get_mut(name)
            .ok_or_else(|| CoreError::MissingObject(name.to_string()))?;
        object.set_pose(pose);
        Ok(())
    }
}

pub async fn load_objects(loader: &dyn AssetLoader, names: &[String]) -> anyhow::Result<ObjectSet> {
    let loaded = try_join_all(names.iter().map(|name| async move {
        loader
            .load_object(name)
            .await
            .with_context(|| format!("loading object '{name}'"))
    }))
    .await?;

    let mut set = ObjectSet::new();
    for object in loaded {
        set.insert(object);
    }
    debug!(count = set.len(), "task: objects loaded");
    Ok(set)
}

pub struct RigObject {
    rig: SimRig,
    name: String,
}

impl SimObject for RigObject {
    fn name(&self) -> &str {
        &self.name
    }

    fn pose(&self) -> Option<Pose> {
        self.rig.object_pose(&self.name)
    }

    fn set_pose(&mut self, pose: Pose) {
        self.rig.set_object_pose(&self.name, pose);
    }
}

#[async_trait]
impl AssetLoader for SimRig {
    async fn load_object(&self, name: &str) -> anyhow::Result<Box<dyn SimObject>> {
        Ok(Box::new(RigObject {
            rig: self.clone(),
            name: name.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLoader;

    #[async_trait]
    impl AssetLoader for FailingLoader {
        async fn load_object(&self, name: &str) -> anyhow::Result<Box<dyn SimObject>> {
            anyhow::bail!("no asset for {name}")
        }
    }

    #[tokio::test]
    async fn loads_every_named_object() {
        let rig = SimRig::new();
        let names = vec!["whiteboard".to_string(), "marker".to_string()];
        let mut objects = load_objects(&rig, &names).await.expect("load");
        assert_eq!(objects.len(), 2);

        assert_eq!(objects.pose("marker"), None);
        objects
            .set_pose("marker", Pose::at(1.0, 1.0, 0.0))
            .expect("marker");
        assert_eq!(rig.object_pose("marker"), Some(Pose::at(1.0, 1.0, 0.0)));
    }

    #[tokio::test]
    async fn loader_failure_names_the_object() {
        let err = load_objects(&FailingLoader, &["cup".to_string()])
            .await
            .err()
            .expect("fails");
        assert!(format!("{err:#}").contains("loading object 'cup'"));
    }

    #[test]
    fn unknown_object_is_transient() {
        let mut objects = ObjectSet::new();
        let err = objects
            .set_pose("eraser", Pose::identity())
            .expect_err("missing");
        assert!(err.is_recoverable());
    }
}
