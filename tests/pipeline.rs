//! End-to-end behaviour of parameter resolution and the bundling pipeline.

mod common;

use common::{AppFixture, FakeToolchain, context};
use kodegen_bundler_package::bundler::{
    Bundler, BundleRequest, BundlerRegistry, Dispatcher, ErrorKind, FormatSelection, ParamStore,
    params::standard::{APP_FS_NAME, IDENTIFIER, LINUX_CATEGORY, MENU_HINT, RUNTIME, XDG_FILE_PREFIX},
    platform::linux::rpm::RpmBundler,
};
use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

fn request(fixture: &AppFixture, formats: &[&str]) -> BundleRequest {
    BundleRequest {
        store: fixture.store.clone(),
        output_dir: fixture.output_dir(),
        selection: FormatSelection::from_ids(formats.iter().copied()),
    }
}

#[test]
fn resolving_twice_yields_the_same_value_and_leaves_the_store_alone() {
    let fixture = AppFixture::new();
    let before = fixture.store.clone();

    let first = (
        APP_FS_NAME.require(&fixture.store).unwrap(),
        IDENTIFIER.require(&fixture.store).unwrap(),
        XDG_FILE_PREFIX.require(&fixture.store).unwrap(),
    );
    let second = (
        APP_FS_NAME.require(&fixture.store).unwrap(),
        IDENTIFIER.require(&fixture.store).unwrap(),
        XDG_FILE_PREFIX.require(&fixture.store).unwrap(),
    );

    assert_eq!(first, second);
    assert_eq!(first.0, "HelloWorld");
    assert_eq!(fixture.store, before);
}

#[test]
fn explicit_null_suppresses_the_default() {
    let fixture = AppFixture::new();
    assert!(RUNTIME.fetch_from(&fixture.store).unwrap().is_some());

    let mut store = fixture.store.clone();
    store.insert_null("runtime");
    assert_eq!(RUNTIME.fetch_from(&store).unwrap(), None);
}

#[test]
fn unknown_enumerated_labels_have_no_identifier() {
    assert_eq!(LINUX_CATEGORY.value_for("Development").map(String::as_str), Some("Development"));
    assert!(LINUX_CATEGORY.value_for("Not A Category").is_none());

    let mut store = ParamStore::new();
    store.insert("linux.category", "Not A Category");
    let err = LINUX_CATEGORY.fetch_from(&store).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn failed_validation_has_no_side_effects() {
    let mut fixture = AppFixture::new();
    fixture.store.insert("mainBinary", fixture.root.path().join("missing"));
    let tools = Arc::new(FakeToolchain::installed());
    let registry = BundlerRegistry::standard();

    let report = Dispatcher::new(&registry, context(&tools))
        .run(request(&fixture, &["rpm"]))
        .await;

    let (_, error) = report.failures()[0];
    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(!fixture.build_root().exists());
    assert!(tools.runs().is_empty());
}

#[tokio::test]
async fn newest_artifact_wins_over_stale_leftovers() {
    let fixture = AppFixture::new();
    std::fs::create_dir_all(fixture.output_dir()).unwrap();
    let stale = fixture.output_dir().join("helloworld-0.9-1.x86_64.rpm");
    let file = std::fs::File::create(&stale).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(3600))
        .unwrap();

    let tools = Arc::new(FakeToolchain::installed());
    let registry = BundlerRegistry::standard();
    let report = Dispatcher::new(&registry, context(&tools))
        .run(request(&fixture, &["rpm"]))
        .await;

    let artifacts = report.artifacts();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(
        artifacts[0].path.file_name().unwrap(),
        "helloworld-1.0-1.x86_64.rpm"
    );
    assert_eq!(artifacts[0].size, "fake artifact".len() as u64);
    assert_eq!(artifacts[0].checksum.len(), 64);
}

#[tokio::test]
async fn per_user_daemons_are_rejected() {
    let mut fixture = AppFixture::new();
    fixture.store.insert("serviceHint", true);
    fixture.store.insert("systemWide", false);
    let tools = Arc::new(FakeToolchain::installed());
    let ctx = context(&tools);

    let err = RpmBundler.validate(&fixture.store, &ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.advice().unwrap().contains("system wide"));

    fixture.store.insert("systemWide", true);
    RpmBundler.validate(&fixture.store, &ctx).await.unwrap();
}

#[tokio::test]
async fn working_directory_is_removed_after_a_tool_failure() {
    let fixture = AppFixture::new();
    let tools = Arc::new(FakeToolchain::installed().failing("rpmbuild"));
    let mut store = fixture.store.clone();

    let err = RpmBundler
        .bundle(&mut store, &fixture.output_dir(), &context(&tools))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NativeTool);
    assert!(err.to_string().starts_with("rpm invoking"));
    assert!(err.tool_output().unwrap().contains("simulated failure"));
    assert!(fixture.working_dirs("rpm").is_empty());
}

#[tokio::test]
async fn working_directory_is_kept_when_retained() {
    let fixture = AppFixture::new();
    let tools = Arc::new(FakeToolchain::installed().failing("rpmbuild"));
    let ctx = context(&tools).with_retain_working_dir(true);
    let mut store = fixture.store.clone();

    RpmBundler
        .bundle(&mut store, &fixture.output_dir(), &ctx)
        .await
        .unwrap_err();

    let kept = fixture.working_dirs("rpm");
    assert_eq!(kept.len(), 1);
    assert!(kept[0].join("image/HelloWorld.spec").is_file());
}

#[tokio::test]
async fn one_failing_format_does_not_stop_the_others() {
    let mut fixture = AppFixture::new();
    fixture.store.insert("linux.deb.bundleName", "Not_Debian");
    let tools = Arc::new(FakeToolchain::installed());
    let registry = BundlerRegistry::standard();

    let report = Dispatcher::new(&registry, context(&tools))
        .run(request(&fixture, &["deb", "rpm"]))
        .await;

    assert!(!report.all_succeeded());
    let deb = report.outcome("deb").unwrap();
    assert_eq!(deb.result.as_ref().unwrap_err().kind(), ErrorKind::Configuration);
    assert!(report.outcome("rpm").unwrap().result.is_ok());
    assert_eq!(tools.run_programs(), vec!["rpmbuild"]);
}

#[tokio::test]
async fn every_format_validates_before_any_is_built() {
    let fixture = AppFixture::new();
    let tools = Arc::new(FakeToolchain::installed().without("makensis"));
    let registry = BundlerRegistry::standard();

    let report = Dispatcher::new(&registry, context(&tools))
        .run(request(&fixture, &["rpm", "exe", "deb"]))
        .await;

    let formats: Vec<_> = report.outcomes.iter().map(|o| o.format.as_str()).collect();
    assert_eq!(formats, vec!["rpm", "exe", "deb"]);
    let exe = report.outcome("exe").unwrap().result.as_ref().unwrap_err();
    assert_eq!(exe.kind(), ErrorKind::UnsupportedPlatform);
    assert_eq!(report.artifacts().len(), 2);
    assert_eq!(tools.probes(), vec!["rpmbuild", "dpkg-deb"]);
    assert_eq!(tools.run_programs(), vec!["rpmbuild", "dpkg-deb"]);
}

#[tokio::test]
async fn missing_shortcuts_turn_the_menu_entry_back_on() {
    let mut fixture = AppFixture::new();
    fixture.store.insert("menuHint", false);
    fixture.store.insert("shortcutHint", false);
    let tools = Arc::new(FakeToolchain::installed());
    let mut store = fixture.store.clone();

    RpmBundler
        .bundle(&mut store, &fixture.output_dir(), &context(&tools))
        .await
        .unwrap();

    assert!(MENU_HINT.require(&store).unwrap());
}

#[tokio::test]
async fn verbose_runs_save_rendered_config_files() {
    let fixture = AppFixture::new();
    let tools = Arc::new(FakeToolchain::installed());
    let ctx = context(&tools).with_verbose(true);
    let mut store = fixture.store.clone();

    RpmBundler
        .bundle(&mut store, &fixture.output_dir(), &ctx)
        .await
        .unwrap();

    let saved = fixture.build_root().join("rpm-config");
    assert!(saved.join("HelloWorld.spec").is_file());
    assert!(saved.join("HelloWorld.desktop").is_file());
}

#[tokio::test]
async fn bad_parameter_values_fail_before_any_working_directory() {
    let registry = BundlerRegistry::standard();
    let cases: [fn(&mut ParamStore); 3] = [
        |store: &mut ParamStore| store.insert("linux.category", "Bogus"),
        |store: &mut ParamStore| store.insert("startOnInstall", "maybe"),
        |store: &mut ParamStore| store.insert_null("appVersion"),
    ];

    for corrupt in cases {
        let mut fixture = AppFixture::new();
        corrupt(&mut fixture.store);
        let tools = Arc::new(FakeToolchain::installed());
        let ctx = context(&tools).with_retain_working_dir(true);

        let report = Dispatcher::new(&registry, ctx)
            .run(request(&fixture, &["rpm", "deb"]))
            .await;

        assert_eq!(report.failures().len(), 2);
        for (_, error) in report.failures() {
            assert_eq!(error.kind(), ErrorKind::Configuration);
            assert!(!error.to_string().contains("rendering"));
        }
        assert!(!fixture.build_root().exists());
        assert!(tools.runs().is_empty());
    }
}

#[tokio::test]
async fn unnamed_secondary_launcher_cannot_replace_the_primary() {
    let mut fixture = AppFixture::new();
    let helper_binary = fixture.root.path().join("src/helper");
    std::fs::write(&helper_binary, "HELPER").unwrap();
    let mut helper = ParamStore::new();
    helper.insert("mainBinary", helper_binary);
    fixture.store.insert("secondaryLaunchers", vec![helper]);
    let tools = Arc::new(FakeToolchain::installed());

    let err = RpmBundler
        .validate(&fixture.store, &context(&tools))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("has no name"));

    let mut clash = ParamStore::new();
    clash.insert("appName", "Hello World");
    fixture.store.insert("secondaryLaunchers", vec![clash]);
    let err = RpmBundler
        .validate(&fixture.store, &context(&tools))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already taken"));
    assert!(tools.probes().is_empty());
}
