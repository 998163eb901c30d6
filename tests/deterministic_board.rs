use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgba, RgbaImage};
use snakeboard::rendering::svg;
use snakeboard::{BoardRenderer, GameConfig, RendererConfig, TeamPosition};

fn inline_png(color: [u8; 4]) -> String {
    let img = RgbaImage::from_pixel(48, 20, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode fixture");
    format!("data:image/png;base64,{}", BASE64.encode(out.into_inner()))
}

fn fixture() -> (GameConfig, Vec<TeamPosition>) {
    let json = serde_json::json!({
        "tileTasks": {
            "7": { "name": "Bake a cake", "imageRef": inline_png([200, 40, 40, 255]) },
            "25": { "name": "Collect every single seashell on the beach" },
            "33": { "imageRef": inline_png([20, 90, 200, 128]) },
            "64": { "name": "Run 5k", "description": "Any pace", "imageRef": inline_png([200, 40, 40, 255]) },
            "80": { "imageRef": inline_png([240, 200, 0, 255]) }
        },
        "snakes": { "16": 6, "47": 26, "49": 11, "62": 19, "87": 24, "98": 78 },
        "ladders": { "1": 38, "4": 14, "9": 31, "21": 42, "28": 84, "71": 91 }
    });
    let game: GameConfig = serde_json::from_value(json).expect("fixture");
    let teams = (0..6)
        .map(|i| TeamPosition::new(format!("Team {}", i), 10 + i * 13))
        .chain(std::iter::once(TeamPosition::new("Also Ten", 10)))
        .collect();
    (game, teams)
}

fn renderer(image_concurrency: usize) -> BoardRenderer {
    // no host fonts so the output does not depend on the machine
    BoardRenderer::new(RendererConfig { load_system_fonts: false, image_concurrency, ..Default::default() })
        .expect("renderer")
}

#[tokio::test]
async fn renders_are_deterministic() {
    let (game, teams) = fixture();
    let first = renderer(4).render(&game, &teams).await.expect("first render");
    let second = renderer(4).render(&game, &teams).await.expect("second render");
    assert_eq!(first.digest(), second.digest());
}

#[tokio::test]
async fn image_concurrency_does_not_change_the_board() {
    let (game, teams) = fixture();

    let sequential = renderer(1);
    let parallel = renderer(8);
    let seq_images = sequential.prepare_images(&game).await;
    let par_images = parallel.prepare_images(&game).await;
    assert_eq!(seq_images.keys().collect::<Vec<_>>(), vec![&7, &33, &64, &80]);
    assert_eq!(seq_images.keys().collect::<Vec<_>>(), par_images.keys().collect::<Vec<_>>());

    let seq_svg = svg::to_svg(&sequential.compose(&game, &teams, &seq_images));
    let par_svg = svg::to_svg(&parallel.compose(&game, &teams, &par_images));
    assert_eq!(seq_svg, par_svg);

    let a = sequential.render(&game, &teams).await.expect("sequential render");
    let b = parallel.render(&game, &teams).await.expect("parallel render");
    assert_eq!(a.digest(), b.digest());
}
