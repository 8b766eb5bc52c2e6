// Test doubles shared by the service tests

use async_trait::async_trait;
use mockall::mock;

use pressure_counter_data::{Measurement, MeasurementStorage, Statistics, StorageError};

mock! {
    pub Storage {}

    #[async_trait]
    impl MeasurementStorage for Storage {
        async fn get_all(&self) -> Result<Vec<Measurement>, StorageError>;
        async fn get_by_id(&self, id: i64) -> Result<Option<Measurement>, StorageError>;
        async fn get_latest(&self) -> Result<Option<Measurement>, StorageError>;
        async fn get_between(&self, start: i64, end: i64) -> Result<Vec<Measurement>, StorageError>;
        async fn get_from(&self, start: i64) -> Result<Vec<Measurement>, StorageError>;
        async fn count(&self) -> Result<usize, StorageError>;
        async fn insert(&self, measurement: &Measurement) -> Result<i64, StorageError>;
        async fn update(&self, measurement: &Measurement) -> Result<(), StorageError>;
        async fn delete_by_id(&self, id: i64) -> Result<(), StorageError>;
        async fn delete_all(&self) -> Result<(), StorageError>;
        async fn aggregate(&self, start: i64, end: i64) -> Result<Statistics, StorageError>;
    }
}
