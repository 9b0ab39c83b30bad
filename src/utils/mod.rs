pub mod csv_handler;
pub mod ip;
pub mod password;
pub mod url_builder;
pub mod validators;

/// 生成加密安全的随机 token（字母 + 数字）
pub fn generate_secure_token(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}

/// 生成 6 位数字验证码（保留前导 0）
pub fn generate_otp_code() -> String {
    format!("{:06}", rand::random_range(0..1_000_000u32))
}
