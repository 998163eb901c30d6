use criterion::{criterion_group, criterion_main, Criterion};

use snakeboard::rendering::images::TileImages;
use snakeboard::rendering::layout::BOARD_SIZE;
use snakeboard::rendering::{compose, raster, svg};
use snakeboard::{GameConfig, TeamPosition};

fn populated_board() -> (GameConfig, Vec<TeamPosition>) {
    let mut json = serde_json::json!({
        "snakes": { "16": 6, "47": 26, "49": 11, "56": 53, "62": 19, "64": 60, "87": 24, "93": 73, "95": 75, "98": 78 },
        "ladders": { "1": 38, "4": 14, "9": 31, "21": 42, "28": 84, "36": 44, "51": 67, "71": 91, "80": 100 },
        "tileTasks": {}
    });
    for tile in 1..=100 {
        json["tileTasks"][tile.to_string()] = serde_json::json!({ "name": format!("Task number {} with a long name", tile) });
    }
    let game = serde_json::from_value(json).expect("bench game");
    let teams = (0..8).map(|i| TeamPosition::new(format!("Team {}", i), 5 + i * 11)).collect();
    (game, teams)
}

fn bench_compose(c: &mut Criterion) {
    let (game, teams) = populated_board();
    let images = TileImages::new();
    c.bench_function("compose_and_serialize", |b| {
        b.iter(|| svg::to_svg(&compose::compose_board(&game, &teams, &images)))
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let (game, teams) = populated_board();
    let document = svg::to_svg(&compose::compose_board(&game, &teams, &TileImages::new()));
    let mut group = c.benchmark_group("raster");
    group.sample_size(10);
    group.bench_function("rasterize_board", |b| {
        b.iter(|| raster::rasterize_svg(&document, BOARD_SIZE, BOARD_SIZE, false).expect("rasterize"))
    });
    group.finish();
}

criterion_group!(benches, bench_compose, bench_rasterize);
criterion_main!(benches);
