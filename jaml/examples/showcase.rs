//! End-to-end showcase: nested records, sequences, maps, and
//! constructor-call values, all from one document.
//!
//! Run with `cargo run --example showcase`.

use std::collections::HashMap;

use jaml::{Registry, Shape, jaml_record};

#[derive(Debug, Default, PartialEq, Clone)]
struct Point {
    x: i64,
    y: i64,
}

#[derive(Debug, Default)]
struct Scene {
    title: String,
    origin: Point,
    points: Vec<Point>,
    layers: HashMap<String, i64>,
}

fn main() {
    let mut registry = Registry::new();
    registry.register(
        Shape::record::<Point>("Point")
            .field("x", |point: &mut Point, value: i64| point.x = value)
            .field("y", |point: &mut Point, value: i64| point.y = value)
            .with_default()
            .ctor2(|x: i64, y: i64| Point { x, y })
            .build(),
    );
    registry.register_list::<Point>();
    registry.register_map::<String, i64>();
    jaml_record!(registry, Scene as "Scene" {
        title: String,
        origin: Point,
        points: Vec<Point>,
        layers: HashMap<String, i64>,
    });

    let input = r#"
# a small scene
title: "demo # 1"
origin: Point(3,4)
points:
  - Point(1,1)
  - Point(2,2)
  -
    x: 5
    y: 6
layers:
  background: 0
  overlay: 2
"#;

    let scene: Scene = jaml::from_str(&registry, input).expect("showcase input parses");
    println!("{scene:#?}");
}
