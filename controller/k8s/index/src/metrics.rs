use kube::Resource;
use kubert::index::{IndexNamespacedResource, NamespacedRemoved};
use parking_lot::RwLock;
use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family, gauge::Gauge},
    registry::Registry,
};
use std::sync::Arc;

/// Index update metrics, shared by all instrumented indexes and labelled by
/// the kind of resource indexed.
#[derive(Clone, Debug)]
pub struct IndexMetrics {
    size: Family<KindLabels, Gauge>,
    applies: Family<KindLabels, Counter>,
    deletes: Family<KindLabels, Counter>,
    resets: Family<KindLabels, Counter>,
}

/// Wraps an index to record [`IndexMetrics`] for its updates.
#[derive(Debug)]
pub struct Instrumented<T> {
    inner: Arc<RwLock<T>>,
    metrics: IndexMetrics,
}

/// Reports the number of resources of kind `R` held by an index.
pub trait SizedIndex<R> {
    fn size(&self) -> usize;
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

// === impl IndexMetrics ===

impl IndexMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let size = Family::default();
        reg.register(
            "size",
            "The number of resources in the index",
            size.clone(),
        );

        let applies = Family::default();
        reg.register("applies", "Count of applies to the index", applies.clone());

        let deletes = Family::default();
        reg.register("deletes", "Count of deletes from the index", deletes.clone());

        let resets = Family::default();
        reg.register("resets", "Count of resets of the index", resets.clone());

        Self {
            size,
            applies,
            deletes,
            resets,
        }
    }

    pub fn instrument<T>(&self, inner: Arc<RwLock<T>>) -> Arc<RwLock<Instrumented<T>>> {
        Arc::new(RwLock::new(Instrumented {
            inner,
            metrics: self.clone(),
        }))
    }
}

// === impl Instrumented ===

impl<T> Instrumented<T> {
    fn labels<R: Resource<DynamicType = ()>>() -> KindLabels {
        KindLabels {
            kind: R::kind(&()).to_string(),
        }
    }

    fn set_size<R>(&self, labels: &KindLabels)
    where
        T: SizedIndex<R>,
    {
        let size = self.inner.read().size();
        self.metrics
            .size
            .get_or_create(labels)
            .set(size.try_into().unwrap_or(i64::MAX));
    }
}

impl<R, T> IndexNamespacedResource<R> for Instrumented<T>
where
    T: IndexNamespacedResource<R> + SizedIndex<R>,
    R: Resource<DynamicType = ()>,
{
    fn apply(&mut self, resource: R) {
        let labels = Self::labels::<R>();
        self.metrics.applies.get_or_create(&labels).inc();
        self.inner.write().apply(resource);
        self.set_size::<R>(&labels);
    }

    fn delete(&mut self, namespace: String, name: String) {
        let labels = Self::labels::<R>();
        self.metrics.deletes.get_or_create(&labels).inc();
        self.inner.write().delete(namespace, name);
        self.set_size::<R>(&labels);
    }

    fn reset(&mut self, resources: Vec<R>, removed: NamespacedRemoved) {
        let labels = Self::labels::<R>();
        self.metrics.resets.get_or_create(&labels).inc();
        self.inner.write().reset(resources, removed);
        self.set_size::<R>(&labels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnersIndex;
    use k8s_openapi::{api::core::v1::Pod, apimachinery::pkg::apis::meta::v1::ObjectMeta};
    use prometheus_client::encoding::text::encode;

    fn mk_pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                namespace: Some("ns".to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn records_index_updates() {
        let mut reg = Registry::default();
        let metrics = IndexMetrics::register(reg.sub_registry_with_prefix("index"));
        let index = OwnersIndex::shared();
        let instrumented = metrics.instrument(index.clone());

        instrumented.write().apply(mk_pod("ngx-1"));
        instrumented.write().apply(mk_pod("ngx-2"));
        IndexNamespacedResource::<Pod>::delete(
            &mut *instrumented.write(),
            "ns".to_string(),
            "ngx-1".to_string(),
        );
        assert_eq!(index.read().pods_named("ngx-2").len(), 1);

        let mut out = String::new();
        encode(&mut out, &reg).unwrap();
        assert!(out.contains("index_size{kind=\"Pod\"} 1"), "{out}");
        assert!(out.contains("index_applies_total{kind=\"Pod\"} 2"), "{out}");
        assert!(out.contains("index_deletes_total{kind=\"Pod\"} 1"), "{out}");
    }
}
