//! Shared setup: a fresh SQLite database per test, one bootstrapped restaurant

#![allow(dead_code)]

use sop_manager::config::AppConfig;
use sop_manager::runtime::lifetime::AppServices;
use sop_manager::services::{Actor, BootstrapRequest, CreateStaffRequest};
use sop_manager::storage::{RestaurantScope, Role, Staff, StorageFactory};
use tempfile::TempDir;

pub const ADMIN_PIN: &str = "4826";
pub const STAFF_PIN: &str = "7391";

pub struct TestEnv {
    // 必须存活到测试结束
    _dir: TempDir,
    pub config: AppConfig,
    pub services: AppServices,
    pub restaurant_id: String,
    pub admin: Staff,
}

impl TestEnv {
    pub fn admin_actor(&self) -> Actor {
        Actor::new(&self.admin.id, Role::Admin, self.scope())
    }

    pub fn scope(&self) -> RestaurantScope {
        RestaurantScope::new(&self.restaurant_id)
    }

    pub fn actor_for(&self, staff: &Staff) -> Actor {
        Actor::new(&staff.id, staff.role, self.scope())
    }

    /// 以 admin 身份创建员工
    pub async fn add_staff(&self, email: &str, role: Role) -> Staff {
        self.services
            .staff
            .create(
                &self.admin_actor(),
                CreateStaffRequest {
                    email: email.to_string(),
                    full_name: format!("Test {}", role),
                    full_name_th: None,
                    role,
                    pin: STAFF_PIN.to_string(),
                },
            )
            .await
            .expect("create staff")
    }

    /// 在同一个数据库里再建一家餐厅，返回它的 admin
    pub async fn second_restaurant(&self) -> Actor {
        let (restaurant, admin) = self
            .services
            .staff
            .bootstrap(bootstrap_request("Second Kitchen", "owner@second.example"))
            .await
            .expect("bootstrap second restaurant");
        Actor::new(admin.id, Role::Admin, RestaurantScope::new(restaurant.id))
    }
}

fn bootstrap_request(name: &str, email: &str) -> BootstrapRequest {
    BootstrapRequest {
        restaurant_name: name.to_string(),
        restaurant_name_th: Some("ร้านทดสอบ".to_string()),
        timezone: "Asia/Bangkok".to_string(),
        admin: CreateStaffRequest {
            email: email.to_string(),
            full_name: "Owner".to_string(),
            full_name_th: None,
            role: Role::Admin,
            pin: ADMIN_PIN.to_string(),
        },
    }
}

pub async fn setup() -> TestEnv {
    setup_with(|_| {}).await
}

/// `tweak` 可以在构建服务前调整配置（例如缓存 TTL、锁定阈值）
pub async fn setup_with(tweak: impl FnOnce(&mut AppConfig)) -> TestEnv {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("sop_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let mut config = AppConfig::default();
    config.database.database_url = db_url.clone();
    config.storage.attachments_dir = dir.path().join("attachments").display().to_string();
    config.auth.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    tweak(&mut config);

    let storage = StorageFactory::create_with_url(&db_url)
        .await
        .expect("create storage");
    let services = AppServices::build(storage, &config);

    let (restaurant, admin) = services
        .staff
        .bootstrap(bootstrap_request("Baan Thai", "owner@baan.example"))
        .await
        .expect("bootstrap");

    TestEnv {
        _dir: dir,
        config,
        services,
        restaurant_id: restaurant.id,
        admin,
    }
}
