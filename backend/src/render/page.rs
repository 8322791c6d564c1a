//! Embedded home page holding the upload form.
//!
//! Element ids and field names are shared with the frontend's `config.rs`.
//! The frontend bundle is served from `/pkg` (wasm-pack `--target web`).

pub const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>wc3stats</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@4.6.2/dist/css/bootstrap.min.css">
    <link rel="stylesheet" href="https://cdn.datatables.net/1.13.8/css/dataTables.bootstrap4.min.css">
    <link rel="stylesheet" href="https://cdn.datatables.net/responsive/2.5.0/css/responsive.bootstrap4.min.css">
</head>
<body>
    <div class="container mt-4">
        <h1>wc3stats</h1>
        <form method="post" action="/upload" enctype="multipart/form-data">
            <div class="form-group">
                <label for="inputName">Player name</label>
                <input type="text" class="form-control" id="inputName" name="playerName" autocomplete="off">
            </div>
            <div class="form-group">
                <label for="inputReplays">Replays</label>
                <input type="file" class="form-control-file" id="inputReplays" name="replays" accept=".w3g" multiple>
            </div>
            <button type="submit" class="btn btn-primary" id="btnSubmit" disabled="true">Upload</button>
        </form>
        <div class="progress mt-3">
            <div class="progress-bar" id="progressBar" role="progressbar" aria-valuenow="0" aria-valuemin="0" aria-valuemax="100" style="width: 0%;">0%</div>
        </div>
        <div class="alert alert-danger mt-3" id="uploadError" role="alert" hidden></div>
        <div id="bodyContainer" class="mt-4"></div>
    </div>

    <script src="https://code.jquery.com/jquery-3.7.1.min.js"></script>
    <script src="https://cdn.datatables.net/1.13.8/js/jquery.dataTables.min.js"></script>
    <script src="https://cdn.datatables.net/1.13.8/js/dataTables.bootstrap4.min.js"></script>
    <script src="https://cdn.datatables.net/responsive/2.5.0/js/dataTables.responsive.min.js"></script>
    <script type="module">
        import init from '/pkg/wc3stats_frontend.js';
        init();
    </script>
</body>
</html>
"#;
