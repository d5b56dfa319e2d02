/// Process exit codes for `sftp-batch`.
pub mod exit {
    pub const SUCCESS: i32 = 0;
    pub const RUN_FAILED: i32 = 1;
    pub const CANCELLED: i32 = 2;
    pub const USAGE: i32 = 3;
}
