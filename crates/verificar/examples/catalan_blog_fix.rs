//! The Catalan blog-fix verification against a live application.
//!
//! Requires the `browser` feature and a running instance of the application
//! on localhost:3004:
//!
//! ```sh
//! cargo run --example catalan_blog_fix --features browser
//! ```
//!
//! Exits non-zero if the corrected text is not visible after clicking the
//! Foslog v0.4.0 post link.

use verificar::{trace, ChromiumDriver, DriverConfig, PageDriver, Scenario, ScenarioConfig};

#[tokio::main]
async fn main() {
    trace::init();

    let config = ScenarioConfig::new().with_screenshot_path("ca-blog-post-final-fix.png");
    let scenario = Scenario::new(config);

    let driver_config = DriverConfig::new().with_viewport(1280, 720).with_no_sandbox();
    let mut driver = match ChromiumDriver::launch(driver_config).await {
        Ok(driver) => driver,
        Err(err) => {
            eprintln!("could not launch browser: {err}");
            std::process::exit(2);
        }
    };

    let report = scenario.run(&mut driver).await;
    if let Err(err) = driver.close().await {
        eprintln!("warning: browser teardown failed: {err}");
    }

    match report.into_result() {
        Ok(()) => println!("verification passed"),
        Err(err) => {
            eprintln!("verification failed: {err}");
            std::process::exit(1);
        }
    }
}
