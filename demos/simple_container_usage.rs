//! keyed-di 容器 - 简单使用示例
//!
//! 展示推荐的注册方式：实现类型通过 `injectable!` 声明初始化器，
//! 通过 `implements!` 声明自己满足哪个服务 trait。

use keyed_di::logging::init_logging;
use keyed_di::{implements, injectable, ConfigLoader, ServiceContainer};
use std::sync::Arc;

trait Config: Send + Sync {
    fn app_name(&self) -> &str;
}

trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

trait Database: Send + Sync {
    fn connect(&self);
}

struct AppConfig {
    app_name: String,
}

impl Config for AppConfig {
    fn app_name(&self) -> &str {
        &self.app_name
    }
}

struct ConsoleLogger {
    app_name: String,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("[{}] {}", self.app_name, message);
    }
}

struct DatabaseService {
    config: Arc<dyn Config>,
    logger: Arc<dyn Logger>,
}

impl DatabaseService {
    fn new(config: Arc<dyn Config>, logger: Arc<dyn Logger>) -> Self {
        logger.log("Initializing database service");
        Self { config, logger }
    }
}

impl Database for DatabaseService {
    fn connect(&self) {
        self.logger
            .log(&format!("Connecting to database for {}", self.config.app_name()));
    }
}

injectable!(ConsoleLogger, |injector| Ok(ConsoleLogger {
    app_name: injector.resolve::<dyn Config>()?.app_name().to_string(),
}));
injectable!(DatabaseService, |injector| Ok(DatabaseService::new(
    injector.resolve::<dyn Config>()?,
    injector.resolve::<dyn Logger>()?,
)));
implements!(ConsoleLogger => dyn Logger);
implements!(DatabaseService => dyn Database);

fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new().load_config()?;
    init_logging(&config.logging.to_logging_config()).map_err(|e| anyhow::anyhow!(e))?;

    let container = ServiceContainer::with_config(config);

    println!("1️⃣ 注册配置（单例实例，默认键与 test 键各一份）");
    container.register_singleton_instance::<dyn Config>(
        "default",
        Arc::new(AppConfig {
            app_name: "MyApp".to_string(),
        }),
    )?;
    container.register_singleton_instance::<dyn Config>(
        "test",
        Arc::new(AppConfig {
            app_name: "MyApp (test)".to_string(),
        }),
    )?;

    println!("2️⃣ 注册日志服务（单例，依赖配置）");
    container.register_singleton::<dyn Logger, ConsoleLogger>()?;

    println!("3️⃣ 注册数据库服务（瞬态，依赖配置和日志）");
    container.register_transient::<dyn Database, DatabaseService>()?;

    println!("\n4️⃣ 解析和使用服务");
    let db = container.resolve::<dyn Database>()?;
    db.connect();

    println!("\n5️⃣ 按 test 键解析：配置取 test 变体，日志回退到默认单例");
    let test_db = container.resolve_keyed::<dyn Database>("test")?;
    test_db.connect();

    println!("\n6️⃣ 验证生命周期");
    let logger1 = container.resolve::<dyn Logger>()?;
    let logger2 = container.resolve_keyed::<dyn Logger>("test")?;
    println!("日志服务是同一个实例: {}", Arc::ptr_eq(&logger1, &logger2));
    println!("数据库服务是不同实例: {}", !Arc::ptr_eq(&db, &test_db));

    println!("\n7️⃣ 已注册的服务");
    for descriptor in container.registered_services() {
        println!(
            "   {} [{}] {} -> {}",
            descriptor.service, descriptor.key, descriptor.lifetime, descriptor.implementation
        );
    }

    let stats = container.get_stats();
    println!("\n📊 查找次数: {}", stats.lookups);
    println!("🎯 单例命中率: {:.1}%", stats.hit_rate() * 100.0);
    println!("↩️ 键回退次数: {}", stats.key_fallbacks);

    Ok(())
}
