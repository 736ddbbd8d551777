use crate::clustermap::{ClusterMap, Replica};
use crate::config::OperationConfig;

/// Orders candidate replicas: replicas on down nodes last when configured,
/// then local datacenter before remote, then the data node total order.
/// Down replicas are moved, never dropped.
pub fn order_candidates(
    mut replicas: Vec<Replica>,
    config: &OperationConfig,
    cluster_map: &dyn ClusterMap,
) -> Vec<Replica> {
    replicas.sort_by_cached_key(|replica| {
        let node = replica.data_node();
        let deprioritized = config.deprioritize_down_nodes && cluster_map.is_node_down(node);
        let remote = node.datacenter() != config.local_datacenter;
        (deprioritized, remote, node.clone())
    });
    replicas
}
