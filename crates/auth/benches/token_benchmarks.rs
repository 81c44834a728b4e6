use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use todolist_auth::{authorize, Principal, Role, TokenService, User};
use todolist_core::UserId;

fn sample_user() -> User {
    User::new(
        UserId::new(),
        Some("bench@todolist.aos"),
        "bench",
        Role::Basic,
        "$argon2id$v=19$m=19456,t=2,p=1$placeholder".to_string(),
        Utc::now(),
    )
    .expect("valid user")
}

fn bench_tokens(c: &mut Criterion) {
    let svc = TokenService::new(b"bench-secret", Duration::hours(1));
    let user = sample_user();
    let now = Utc::now();
    let token = svc.issue(&user, now).expect("issue");

    c.bench_function("token_issue", |b| {
        b.iter(|| svc.issue(black_box(&user), now).expect("issue"))
    });

    c.bench_function("token_verify", |b| {
        b.iter(|| svc.verify(black_box(&token), now).expect("verify"))
    });
}

fn bench_authorize(c: &mut Criterion) {
    let principal = Principal::new(UserId::new(), "bench", Role::Basic);

    c.bench_function("authorize_role_gate", |b| {
        b.iter(|| authorize(black_box(Some(&principal)), black_box(&[Role::Admin, Role::Basic])))
    });
}

criterion_group!(benches, bench_tokens, bench_authorize);
criterion_main!(benches);
