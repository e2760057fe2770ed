fn main() {
    // Tell cargo to recompile when these compile-time env vars change.
    // Without this, option_env!() values get cached and won't update.
    println!("cargo:rerun-if-env-changed=TASKBOARD_API_URL");
    println!("cargo:rerun-if-env-changed=TASKBOARD_LOGIN_ROUTE");
}
