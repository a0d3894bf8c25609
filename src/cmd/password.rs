//! Password digest helper (`brick hash-password`).

use brick::site::auth::hash_password;

pub fn cmd_hash_password(password: &str) {
    println!("{}", hash_password(password));
}
