use anyhow::Result;
use rdlt_draw::{
    ArcGeometry, ArcProps, AssetRepository, ComponentGeometry, ComponentProps, ComponentType,
    ComponentUid, Editor, Point, Scene,
};

fn editor(name: &str) -> Result<Editor> {
    let assets = AssetRepository::bundled()?;
    Ok(Editor::new(&assets, name)?)
}

fn vertex(editor: &mut Editor, kind: ComponentType, id: &str, x: f64, y: f64) -> ComponentUid {
    editor.add_component(
        kind,
        ComponentProps {
            identifier: id.to_string(),
            is_rbs_center: false,
        },
        Some(ComponentGeometry::at(Point::new(x, y))),
        None,
    )
    .expect("fresh component uid")
}

fn arc_props(c: &str, l: u32) -> ArcProps {
    ArcProps {
        c: c.to_string(),
        l,
    }
}

#[test]
fn small_model_exports_every_section() -> Result<()> {
    let mut editor = editor("orders")?;
    let x1 = vertex(&mut editor, ComponentType::Boundary, "X1", 100.0, 100.0);
    let x2 = vertex(&mut editor, ComponentType::Controller, "X2", 300.0, 200.0);
    let x3 = vertex(&mut editor, ComponentType::Entity, "X3", 150.0, 350.0);

    editor
        .add_arc(x1, x2, arc_props("a", 5), None, None)
        .expect("arc between existing vertices");
    editor
        .add_arc(
            x3,
            x2,
            arc_props("b", 5),
            Some(ArcGeometry::elbowed(vec![Point::new(250.0, 350.0)])),
            None,
        )
        .expect("elbowed arc between existing vertices");

    let file = editor.export_rdlt();
    assert_eq!(file.filename, "orders.txt");

    let text = String::from_utf8(file.contents)?;
    let sections: Vec<&str> = text.split("\n\n").collect();
    assert_eq!(sections.len(), 8, "export should hold eight sections");

    let vertices: Vec<&str> = sections[0].lines().collect();
    assert_eq!(vertices, ["VERTICES", "1 X1 b 0", "2 X2 c 0", "3 X3 e 0"]);

    assert!(sections[1].starts_with("ARCS\n"));
    assert!(sections[1].contains("1-2 a 5"));
    assert!(sections[1].contains("3-2 b 5"));
    assert!(sections[3].contains(" 250,350"), "waypoints should be exported");
    assert!(sections[6].ends_with("V=1 2 3"), "default styles share one class");

    Ok(())
}

#[test]
fn png_export_has_png_header() -> Result<()> {
    let mut editor = editor("picture")?;
    let a = vertex(&mut editor, ComponentType::Boundary, "A", 0.0, 0.0);
    let b = vertex(&mut editor, ComponentType::Entity, "B", 240.0, 80.0);
    editor.add_arc(a, b, arc_props("go", 1), None, None);

    let file = editor.export_png("white", 2.0)?;

    const PNG_MAGIC: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
    assert!(
        file.contents.starts_with(PNG_MAGIC),
        "rendered png should start with PNG header"
    );
    assert!(file.filename.ends_with(".png"));

    Ok(())
}

#[test]
fn empty_model_cannot_be_rasterized() -> Result<()> {
    let mut editor = editor("blank")?;
    assert!(editor.export_png("white", 1.0).is_err());
    Ok(())
}

#[test]
fn moving_a_vertex_updates_its_arcs() -> Result<()> {
    let mut editor = editor("moves")?;
    let a = vertex(&mut editor, ComponentType::Boundary, "A", 0.0, 0.0);
    let b = vertex(&mut editor, ComponentType::Entity, "B", 200.0, 0.0);
    let arc = editor
        .add_arc(a, b, arc_props("", 1), None, None)
        .expect("arc between existing vertices");

    let before = editor.view().arc(arc).and_then(|p| p.route.clone());
    let rerouted = editor
        .update_component_position(b, 200.0, 200.0)
        .expect("vertex exists");
    assert_eq!(rerouted, vec![arc]);

    let after = editor.view().arc(arc).and_then(|p| p.route.clone());
    assert_ne!(before, after);

    let svg = editor.export_svg("white")?;
    assert!(svg.contains("<svg"));

    Ok(())
}

#[test]
fn self_loops_do_not_break_rendering() -> Result<()> {
    let mut editor = editor("loops")?;
    let a = vertex(&mut editor, ComponentType::Controller, "A", 50.0, 50.0);
    let arc = editor.add_arc(a, a, arc_props("again", 2), None, None);

    assert!(arc.is_some(), "self-loops are kept in the model");
    editor.run_frame();
    let svg = editor.export_svg("white")?;
    assert!(svg.contains("<svg"));
    assert!(String::from_utf8(editor.export_rdlt().contents)?.contains("1-1 again 2"));

    Ok(())
}

#[test]
fn uids_are_never_reused() -> Result<()> {
    let mut editor = editor("uids")?;
    let a = vertex(&mut editor, ComponentType::Entity, "A", 0.0, 0.0);
    let b = vertex(&mut editor, ComponentType::Entity, "B", 100.0, 0.0);
    editor.remove_component(b);
    let c = vertex(&mut editor, ComponentType::Entity, "C", 200.0, 0.0);

    assert_ne!(b, c);
    assert!(c > a);
    assert_eq!(editor.model().component_count(), 2);

    Ok(())
}

#[test]
fn scene_files_replay_into_a_model() -> Result<()> {
    let scene = Scene::parse(
        r#"{
            "name": "replayed",
            "components": [
                { "type": "boundary", "identifier": "In", "position": { "x": 0, "y": 0 } },
                { "type": "entity", "identifier": "Out", "position": { "x": 180, "y": 0 } }
            ],
            "arcs": [ { "from": "In", "to": "Out", "C": "x" } ]
        }"#,
    )?;

    let mut editor = editor("scratch")?;
    let keys = scene.apply(&mut editor)?;

    assert_eq!(keys.len(), 2);
    assert_eq!(editor.model().name(), "replayed");
    assert_eq!(editor.model().arc_count(), 1);

    Ok(())
}
