//! Script text injected into the viewer frames to draw shapes.
//!
//! Everything produced here runs inside the `.then(function(K3DInstance) { ... })`
//! callback of the widget's own module script, so `K3DInstance` and the three.js
//! imports from [`crate::splice::DRAW_PRELUDE`] are in scope.

use crate::ids::{BRIDGE_ELEMENT, CANVAS_TARGET, USER_OBJECT_START};
use crate::shape::{CLEAR_SENTINEL, ShapeDescriptor, ShapeKind};

/// three.js release the injected modules import.
pub const THREE_VERSION: &str = "0.154.0";

/// Import map placed in the frame's `<head>`. Browsers refuse to change an
/// import map once parsed, so this is injected once per frame and never replaced.
pub fn head_import_map() -> String {
    format!(
        "{{ \"imports\": {{ \
         \"three\": \"https://unpkg.com/three@{v}/build/three.module.js\", \
         \"three/addons/\": \"https://unpkg.com/three@{v}/examples/jsm/\" \
         }} }} ",
        v = THREE_VERSION
    )
}

// Pointer-drag controls limited to the objects handed to the constructor and
// only active while Ctrl is held, so plain drags still orbit the camera.
const DRAG_CONTROLS: &str = r#"
    const _plane = new Plane();
    const _raycaster = new Raycaster();
    const _pointer = new Vector2();
    const _offset = new Vector3();
    const _intersection = new Vector3();
    const _worldPosition = new Vector3();
    const _inverseMatrix = new Matrix4();

    class DragControls extends EventDispatcher {
        constructor( _objects, _camera, _domElement ) {
            super();
            _domElement.style.touchAction = 'none';
            let _selected = null, _hovered = null;
            const _intersections = [];
            const scope = this;

            function activate() {
                _domElement.addEventListener( 'pointermove', onPointerMove );
                _domElement.addEventListener( 'pointerdown', onPointerDown );
                _domElement.addEventListener( 'pointerup', onPointerCancel );
                _domElement.addEventListener( 'pointerleave', onPointerCancel );
            }

            function deactivate() {
                _domElement.removeEventListener( 'pointermove', onPointerMove );
                _domElement.removeEventListener( 'pointerdown', onPointerDown );
                _domElement.removeEventListener( 'pointerup', onPointerCancel );
                _domElement.removeEventListener( 'pointerleave', onPointerCancel );
                _domElement.style.cursor = '';
            }

            function dispose() {
                deactivate();
            }

            function getObjects() {
                return _objects;
            }

            function getRaycaster() {
                return _raycaster;
            }

            function onPointerMove( event ) {
                if ( scope.enabled === false ) return;
                if ( !event.ctrlKey ) return;
                updatePointer( event );
                _raycaster.setFromCamera( _pointer, _camera );
                if ( _selected ) {
                    if ( _raycaster.ray.intersectPlane( _plane, _intersection ) ) {
                        _selected.position.copy( _intersection.sub( _offset ).applyMatrix4( _inverseMatrix ) );
                    }
                    scope.dispatchEvent( { type: 'drag', object: _selected } );
                    return;
                }
                if ( event.pointerType === 'mouse' || event.pointerType === 'pen' ) {
                    _intersections.length = 0;
                    _raycaster.intersectObjects( _objects, true, _intersections );
                    if ( _intersections.length > 0 ) {
                        const object = _intersections[ 0 ].object;
                        _plane.setFromNormalAndCoplanarPoint( _camera.getWorldDirection( _plane.normal ), _worldPosition.setFromMatrixPosition( object.matrixWorld ) );
                        if ( _hovered !== object && _hovered !== null ) {
                            scope.dispatchEvent( { type: 'hoveroff', object: _hovered } );
                            _domElement.style.cursor = 'auto';
                            _hovered = null;
                        }
                        if ( _hovered !== object ) {
                            scope.dispatchEvent( { type: 'hoveron', object: object } );
                            _domElement.style.cursor = 'pointer';
                            _hovered = object;
                        }
                    } else if ( _hovered !== null ) {
                        scope.dispatchEvent( { type: 'hoveroff', object: _hovered } );
                        _domElement.style.cursor = 'auto';
                        _hovered = null;
                    }
                }
            }

            function onPointerDown( event ) {
                if ( scope.enabled === false ) return;
                if ( !event.ctrlKey ) return;
                updatePointer( event );
                _intersections.length = 0;
                _raycaster.setFromCamera( _pointer, _camera );
                _raycaster.intersectObjects( _objects, true, _intersections );
                if ( _intersections.length > 0 ) {
                    _selected = ( scope.transformGroup === true ) ? _objects[ 0 ] : _intersections[ 0 ].object;
                    _plane.setFromNormalAndCoplanarPoint( _camera.getWorldDirection( _plane.normal ), _worldPosition.setFromMatrixPosition( _selected.matrixWorld ) );
                    if ( _raycaster.ray.intersectPlane( _plane, _intersection ) && _selected.parent ) {
                        _inverseMatrix.copy( _selected.parent.matrixWorld ).invert();
                        _offset.copy( _intersection ).sub( _worldPosition.setFromMatrixPosition( _selected.matrixWorld ) );
                    }
                    _domElement.style.cursor = 'move';
                    scope.dispatchEvent( { type: 'dragstart', object: _selected } );
                }
            }

            function onPointerCancel( event ) {
                if ( scope.enabled === false ) return;
                if ( !event.ctrlKey ) return;
                if ( _selected ) {
                    scope.dispatchEvent( { type: 'dragend', object: _selected } );
                    _selected = null;
                }
                _domElement.style.cursor = _hovered ? 'pointer' : 'auto';
            }

            function updatePointer( event ) {
                const rect = _domElement.getBoundingClientRect();
                _pointer.x = ( event.clientX - rect.left ) / rect.width * 2 - 1;
                _pointer.y = - ( event.clientY - rect.top ) / rect.height * 2 + 1;
            }

            activate();
            this.enabled = true;
            this.transformGroup = false;
            this.activate = activate;
            this.deactivate = deactivate;
            this.dispose = dispose;
            this.getObjects = getObjects;
            this.getRaycaster = getRaycaster;
        }
    }"#;

// Line: (x1,y1,z1) -> (x2,y2,z2).
// Sphere: centre (x1,y1,z1), radius x2, y2 segments, opacity z2.
// Plane: (x1,y1) -> (x2,y2) at z1, opacity z2, positioned by its centre.
const ADD_MESH: &str = r#"
    const addNewLineMesh = (shape, x1, y1, z1, x2, y2, z2, color) => {
        if (shape === 'Line') {
            const material = new THREE.LineBasicMaterial( { color: color } );
            const points = [ new THREE.Vector3(x1, y1, z1), new THREE.Vector3(x2, y2, z2) ];
            const geometry = new THREE.BufferGeometry().setFromPoints( points );
            K3DInstance.getScene().add( new THREE.Line( geometry, material ) );
        } else if (shape === 'Sphere') {
            const geometry = new THREE.SphereGeometry( Number(x2), Number(y2) * 2, Number(y2) );
            const material = new THREE.MeshStandardMaterial( { color: color } );
            material.transparent = true;
            material.opacity = Number(z2) / 100;
            const sphere = new THREE.Mesh( geometry, material );
            sphere.position.set( Number(x1), Number(y1), Number(z1) );
            K3DInstance.getScene().add( sphere );
        } else if (shape === 'Plane') {
            const geometry = new THREE.PlaneGeometry( Number(x2) - Number(x1), Number(y2) - Number(y1) );
            const material = new THREE.MeshStandardMaterial( { color: color, side: THREE.DoubleSide } );
            material.transparent = true;
            material.opacity = Number(z2) / 100;
            const plane = new THREE.Mesh( geometry, material );
            plane.position.set(
                Math.floor((Number(x2) + Number(x1)) / 2),
                Math.floor((Number(y2) + Number(y1)) / 2),
                Number(z1) );
            K3DInstance.getScene().add( plane );
        }
    };"#;

// Creates the bridge button once. Its click handler re-reads the encoded
// descriptor, drops user objects of the same geometry and the previous drag
// controls, then draws unless the paint is the clear sentinel.
const BRIDGE_BOOTSTRAP: &str = r#"
    const _geometryTypes = @@GEOMETRY_TYPES@@;
    let _dragControls = null;
    if (!document.getElementById("@@BRIDGE@@")) {
        const body = document.getElementsByTagName("body")[0];
        const bridge = document.createElement("button");
        bridge.type = "button";
        bridge.style.display = "none";
        bridge.id = "@@BRIDGE@@";
        bridge.name = "@@BRIDGE@@";
        bridge.value = "@@PARAMS@@";
        bridge.onclick = function() {
            const params = document.getElementById("@@BRIDGE@@").value.split(",");
            const scene = K3DInstance.getScene();
            for (let i = scene.children.length - 1; i >= @@USER_START@@; i--) {
                const obj = scene.children[i];
                if (obj.geometry && obj.geometry.type === _geometryTypes[params[0]]) {
                    scene.remove(obj);
                }
            }
            if (_dragControls) {
                _dragControls.dispose();
                _dragControls = null;
            }
            if (params[7].includes('@@CLEAR@@')) return;
            addNewLineMesh(params[0], params[1], params[2], params[3], params[4], params[5], params[6], params[7]);
            if (scene.children.length > @@USER_START@@) {
                const _objects = scene.children.slice(@@USER_START@@);
                const _camera = K3DInstance.getWorld().camera;
                const _domElement = document.getElementById('@@CANVAS@@');
                _dragControls = new DragControls(_objects, _camera, _domElement);
            }
        };
        body.appendChild(bridge);
        bridge.click();
    }"#;

fn geometry_types_literal() -> String {
    let entries: Vec<String> = ShapeKind::ALL
        .iter()
        .map(|k| format!("{}: '{}'", k.as_str(), k.geometry_type()))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

/// Full drawing fragment for `shape`: drag controls, mesh builder and the
/// bridge bootstrap carrying `shape` by value.
pub fn build_draw_fragment(shape: &ShapeDescriptor) -> String {
    let bootstrap = BRIDGE_BOOTSTRAP
        .replace("@@GEOMETRY_TYPES@@", &geometry_types_literal())
        .replace("@@BRIDGE@@", BRIDGE_ELEMENT)
        .replace("@@CANVAS@@", CANVAS_TARGET)
        .replace("@@USER_START@@", &USER_OBJECT_START.to_string())
        .replace("@@CLEAR@@", CLEAR_SENTINEL)
        .replace("@@PARAMS@@", &shape.encode());
    let mut out = String::with_capacity(DRAG_CONTROLS.len() + ADD_MESH.len() + bootstrap.len());
    out.push_str(DRAG_CONTROLS);
    out.push_str(ADD_MESH);
    out.push_str(&bootstrap);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Rgb;

    #[test]
    fn import_map_pins_three_version() {
        let map = head_import_map();
        assert!(map.contains("https://unpkg.com/three@0.154.0/build/three.module.js"));
        assert!(map.contains("\"three/addons/\""));
        assert!(map.trim_start().starts_with('{'));
    }

    #[test]
    fn fragment_embeds_parameters_by_value() {
        let d = ShapeDescriptor::sphere([1.0, 2.0, 3.0], 4.5, 16, 80.0, Rgb::new(0x12, 0x34, 0x56));
        let text = build_draw_fragment(&d);
        assert!(text.contains(r#"bridge.value = "Sphere,1,2,3,4.5,16,80,#123456";"#));
        assert!(!text.contains("@@"));
    }

    #[test]
    fn fragment_is_regenerated_identically() {
        let d = ShapeDescriptor::default_for(ShapeKind::Plane);
        assert_eq!(build_draw_fragment(&d), build_draw_fragment(&d));
    }

    #[test]
    fn handler_matches_every_kind_by_geometry() {
        let text = build_draw_fragment(&ShapeDescriptor::clear(ShapeKind::Line));
        assert!(text.contains(
            "{ Line: 'BufferGeometry', Sphere: 'SphereGeometry', Plane: 'PlaneGeometry' }"
        ));
        assert!(text.contains("i >= 3; i--"));
        assert!(text.contains("if (params[7].includes('clear')) return;"));
    }

    #[test]
    fn previous_drag_controls_are_disposed_before_redraw() {
        let text = build_draw_fragment(&ShapeDescriptor::default_for(ShapeKind::Sphere));
        assert_eq!(text.matches("let _dragControls = null;").count(), 1);
        assert_eq!(text.matches("new DragControls(").count(), 1);
        let dispose = text.find("_dragControls.dispose();").unwrap();
        let clear = text.find("if (params[7].includes('clear')) return;").unwrap();
        let create = text.find("_dragControls = new DragControls(").unwrap();
        assert!(dispose < clear && clear < create);
    }

    #[test]
    fn drag_controls_require_ctrl() {
        let text = build_draw_fragment(&ShapeDescriptor::default_for(ShapeKind::Line));
        assert_eq!(text.matches("if ( !event.ctrlKey ) return;").count(), 3);
        assert!(text.contains("document.getElementById('canvasTarget')"));
    }
}
