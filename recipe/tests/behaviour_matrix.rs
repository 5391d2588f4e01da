//! Behaviour-driven tests for the build matrix.
//!
//! A recording driver stands in for the in-process packaging driver so the
//! scenarios observe exactly which jobs the matrix hands out.

use camino::Utf8PathBuf;
use gtest_recipe::driver::{PackageJob, PackagingDriver};
use gtest_recipe::error::{RecipeError, Result as RecipeResult};
use gtest_recipe::matrix::{MatrixBuilder, MatrixConfig, MatrixReport};
use gtest_recipe::reference::Reference;
use gtest_recipe::settings::BuildType;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::{Cell, RefCell};

#[derive(Default)]
struct RecordingDriver {
    jobs: RefCell<Vec<PackageJob>>,
    fail: Cell<bool>,
}

impl PackagingDriver for RecordingDriver {
    fn package(&self, job: &PackageJob) -> RecipeResult<Utf8PathBuf> {
        self.jobs.borrow_mut().push(job.clone());
        if self.fail.get() {
            return Err(RecipeError::CommandFailed {
                step: "build",
                command: "cmake --build .".to_owned(),
                status: "exit status: 1".to_owned(),
                stderr: "compiler crashed".to_owned(),
            });
        }
        Ok(Utf8PathBuf::from("package").join(job.cell.id()))
    }
}

#[derive(Default)]
struct MatrixWorld {
    builder: RefCell<Option<MatrixBuilder>>,
    driver: RecordingDriver,
    result: RefCell<Option<RecipeResult<MatrixReport>>>,
}

#[fixture]
fn matrix_world() -> MatrixWorld {
    MatrixWorld::default()
}

#[given("the default build matrix for {reference}")]
fn given_default_matrix(matrix_world: &MatrixWorld, reference: String) {
    let reference: Reference = reference.parse().expect("valid reference");
    let mut builder = MatrixBuilder::new(&reference, "demo", "testing");
    builder.add_all(&MatrixConfig::default());
    matrix_world.builder.replace(Some(builder));
}

#[given("the packaging driver fails every cell")]
fn given_failing_driver(matrix_world: &MatrixWorld) {
    matrix_world.driver.fail.set(true);
}

#[when("the matrix is run")]
fn when_matrix_run(matrix_world: &MatrixWorld) {
    let builder = matrix_world.builder.borrow();
    let builder = builder.as_ref().expect("matrix not configured");
    let result = builder.run(&matrix_world.driver);
    matrix_world.result.replace(Some(result));
}

#[then("{count} cells are packaged")]
fn then_cells_packaged(matrix_world: &MatrixWorld, count: usize) {
    let result = matrix_world.result.borrow();
    let report = result
        .as_ref()
        .expect("matrix not run")
        .as_ref()
        .expect("matrix should succeed");
    assert_eq!(report.cells.len(), count);
}

#[then("{count} cells are attempted")]
fn then_cells_attempted(matrix_world: &MatrixWorld, count: usize) {
    assert_eq!(matrix_world.driver.jobs.borrow().len(), count);
}

#[then("every job builds version {version}")]
fn then_every_job_version(matrix_world: &MatrixWorld, version: String) {
    let jobs = matrix_world.driver.jobs.borrow();
    assert!(jobs.iter().all(|job| job.version == version));
}

#[then("the Debug cell uses runtime {runtime}")]
fn then_debug_runtime(matrix_world: &MatrixWorld, runtime: String) {
    let jobs = matrix_world.driver.jobs.borrow();
    let debug = jobs
        .iter()
        .find(|job| job.cell.settings().build_type == BuildType::Debug)
        .expect("debug cell packaged");
    let actual = debug
        .cell
        .settings()
        .compiler
        .runtime
        .expect("msvc runtime");
    assert_eq!(actual.as_str(), runtime);
}

#[then("the run fails for cell {cell}")]
fn then_run_fails(matrix_world: &MatrixWorld, cell: String) {
    let result = matrix_world.result.borrow();
    let result = result.as_ref().expect("matrix not run");
    assert!(
        matches!(result, Err(RecipeError::CellFailed { cell: failed, .. }) if *failed == cell),
        "expected failure for {cell}, got {result:?}"
    );
}

#[scenario(path = "tests/features/recipe.feature", index = 3)]
fn scenario_default_matrix(matrix_world: MatrixWorld) {
    let _ = matrix_world;
}

#[scenario(path = "tests/features/recipe.feature", index = 4)]
fn scenario_failing_cell(matrix_world: MatrixWorld) {
    let _ = matrix_world;
}
