//! End-to-end blob and ref behaviour through a configured namespace.

use std::sync::Arc;
use std::time::Duration;

use rand::{rngs::StdRng, RngCore, SeedableRng};
use uuid::Uuid;

use cask_namespace::{
    Namespace, NamespaceError, RefError, RefOptions, StorageConfig, StorageService, StoreError,
};
use cask_types::{BlobType, HashedBlobRef, ManualClock, NamespaceId};

const TEST_TYPE: BlobType = BlobType::new(Uuid::from_u128(0xafdf76a7_4dee_5333_f5b5_37b8451251ca), 1);

struct Fixture {
    _service: StorageService,
    namespace: Arc<Namespace>,
    clock: Arc<ManualClock>,
}

async fn fixture() -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = StorageConfig::from_toml_str(
        r#"
        [[backends]]
        id = "default-backend"
        type = "memory"

        [[namespaces]]
        id = "default"
        backend = "default-backend"
        gc_delay_hrs = 0.0
        "#,
    )
    .unwrap();
    let clock = Arc::new(ManualClock::new());
    let service = StorageService::new(config, clock.clone()).await.unwrap();
    let namespace = service
        .get_namespace(&NamespaceId::new("default").unwrap())
        .unwrap();
    Fixture {
        _service: service,
        namespace,
        clock,
    }
}

fn test_data(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

async fn write_blob(ns: &Namespace, data: &[u8], refs: &[HashedBlobRef]) -> HashedBlobRef {
    let mut writer = ns.create_writer();
    writer.write_variable_length_bytes(data).unwrap();
    for target in refs {
        writer.write_blob_ref(target).unwrap();
    }
    let handle = writer.complete(TEST_TYPE).await.unwrap();
    handle.flush().await.unwrap();
    handle.into_target()
}

async fn read_blob(ns: &Namespace, target: &HashedBlobRef) -> (Vec<u8>, Vec<HashedBlobRef>) {
    let data = ns
        .blob_ref(target.hash, target.locator.clone())
        .read_blob_data()
        .await
        .unwrap();
    let mut reader = data.reader();
    let payload = reader.read_variable_length_bytes().unwrap().to_vec();
    let mut refs = Vec::new();
    while reader.remaining() > 0 {
        refs.push(reader.read_blob_ref().unwrap());
    }
    (payload, refs)
}

async fn try_read(ns: &Namespace, name: &str) -> Option<HashedBlobRef> {
    ns.try_read_ref(name)
        .await
        .unwrap()
        .map(|handle| handle.into_target())
}

async fn observe(ns: &Namespace) -> [Option<HashedBlobRef>; 3] {
    [
        try_read(ns, "test-ref-1").await,
        try_read(ns, "test-ref-2").await,
        try_read(ns, "test-ref-3").await,
    ]
}

#[tokio::test]
async fn leaf_blob_round_trips() {
    let f = fixture().await;
    let input = test_data(256, 0);
    let target = write_blob(&f.namespace, &input, &[]).await;

    let (payload, refs) = read_blob(&f.namespace, &target).await;
    assert_eq!(payload, input);
    assert!(refs.is_empty());
}

#[tokio::test]
async fn references_round_trip_and_refs_resolve() {
    let f = fixture().await;
    let ns = &f.namespace;

    let input1 = test_data(256, 1);
    let l1 = write_blob(ns, &input1, &[]).await;
    let (payload, refs) = read_blob(ns, &l1).await;
    assert_eq!(payload, input1);
    assert!(refs.is_empty());

    let input2 = test_data(256, 2);
    let l2 = write_blob(ns, &input2, &[l1.clone()]).await;
    let (payload, refs) = read_blob(ns, &l2).await;
    assert_eq!(payload, input2);
    assert_eq!(refs, vec![l1.clone()]);

    let input3 = test_data(256, 3);
    let l3 = write_blob(ns, &input3, &[l1.clone(), l2.clone(), l1.clone()]).await;
    let (payload, refs) = read_blob(ns, &l3).await;
    assert_eq!(payload, input3);
    assert_eq!(refs, vec![l1.clone(), l2, l1]);

    for _ in 0..2 {
        ns.write_ref("hello", &l3, RefOptions::permanent()).await.unwrap();
        let resolved = ns.read_ref("hello").await.unwrap();
        assert_eq!(resolved.locator(), &l3.locator);
    }
}

#[tokio::test]
async fn ref_expiry_timeline() {
    let f = fixture().await;
    let ns = &f.namespace;
    let target = write_blob(ns, &[1, 2, 3], &[]).await;

    let thirty = Duration::from_secs(30 * 60);
    ns.write_ref("test-ref-1", &target, RefOptions::permanent()).await.unwrap();
    ns.write_ref("test-ref-2", &target, RefOptions::sliding(thirty)).await.unwrap();
    ns.write_ref("test-ref-3", &target, RefOptions::expiring(thirty)).await.unwrap();

    let expect = |one: bool, two: bool, three: bool| {
        [one, two, three].map(|live| live.then(|| target.clone()))
    };

    assert_eq!(observe(ns).await, expect(true, true, true)); // 0m
    f.clock.advance(Duration::from_secs(25 * 60));
    assert_eq!(observe(ns).await, expect(true, true, true)); // 25m
    f.clock.advance(Duration::from_secs(25 * 60));
    assert_eq!(observe(ns).await, expect(true, true, false)); // 50m
    f.clock.advance(Duration::from_secs(35 * 60));
    assert_eq!(observe(ns).await, expect(true, false, false)); // 85m
}

#[tokio::test]
async fn read_ref_on_missing_name_fails() {
    let f = fixture().await;
    let err = f.namespace.read_ref("nobody").await.unwrap_err();
    assert!(matches!(err, NamespaceError::Ref(RefError::NotFound { .. })));
}

#[tokio::test]
async fn ref_to_unknown_blob_is_rejected() {
    let f = fixture().await;
    let ns = &f.namespace;
    let real = write_blob(ns, b"real", &[]).await;
    let mut fake = real.clone();
    fake.hash = cask_types::ContentHash::of(b"fake");
    fake.locator = ns.blob_store().locator_for(&fake.hash);

    let err = ns
        .write_ref("dangling", &fake, RefOptions::permanent())
        .await
        .unwrap_err();
    assert!(matches!(err, NamespaceError::Store(StoreError::BlobNotFound { .. })));
    assert!(try_read(ns, "dangling").await.is_none());
}

#[tokio::test]
async fn concurrent_writers_produce_identical_handles() {
    let f = fixture().await;
    let data = test_data(1024, 42);
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let ns = f.namespace.clone();
        let data = data.clone();
        tasks.push(tokio::spawn(async move { write_blob(&ns, &data, &[]).await }));
    }
    let mut targets = Vec::new();
    for task in tasks {
        targets.push(task.await.unwrap());
    }
    assert!(targets.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(f.namespace.blob_store().len(), 1);
}
